//! Dtype inference for arbitrary operands.

use xft_core::{DType, Operand, Result, Scalar, ScalarKind, XftError, is_weakly_typed};

use crate::dtype_promotion::Promoter;

impl Promoter {
    /// Dtype of `value`, optionally canonicalized.
    ///
    /// Literals take the current default dtype of their kind. Int literals
    /// that do not fit the default int are rejected.
    pub fn dtype(&self, value: &Operand<'_>, canonicalize: bool) -> Result<DType> {
        let dtype = self.infer(value)?;
        Ok(if canonicalize {
            self.canonicalize_dtype(dtype)
        } else {
            dtype
        })
    }

    pub(crate) fn dtype_and_weak(&self, value: &Operand<'_>) -> Result<(DType, bool)> {
        Ok((self.dtype(value, false)?, is_weakly_typed(value)))
    }

    fn kind_default(&self, kind: ScalarKind) -> DType {
        match kind {
            ScalarKind::Bool => DType::Bool,
            ScalarKind::Int => self.config.default_int(),
            ScalarKind::Float => self.config.default_float(),
            ScalarKind::Complex => self.config.default_complex(),
        }
    }

    fn infer(&self, value: &Operand<'_>) -> Result<DType> {
        match *value {
            Operand::Missing => Err(XftError::InvalidValue(
                "Cannot infer dtype from None.".into(),
            )),
            Operand::DType(dt) => Ok(dt),
            Operand::Kind(kind) => Ok(self.kind_default(kind)),
            Operand::Scalar(Scalar::Int(v)) => {
                let dtype = self.config.default_int();
                let (lo, hi) = dtype.int_range();
                if v < lo || v > hi {
                    return Err(XftError::Overflow { value: v, dtype });
                }
                Ok(dtype)
            }
            Operand::Scalar(s) => Ok(self.kind_default(s.kind())),
            Operand::Object(obj) => Ok(obj.dtype()),
            Operand::Sequence([]) => Ok(self.config.default_float()),
            Operand::Sequence(items) => self.uncanonical_result_type(items).map(|(dt, _)| dt),
        }
    }
}

/// [`Promoter::dtype`] under the current configuration.
pub fn dtype(value: &Operand<'_>, canonicalize: bool) -> Result<DType> {
    Promoter::current().dtype(value, canonicalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xft_core::{HasDType, PromotionConfig};

    fn wide() -> Promoter {
        Promoter::new(PromotionConfig::DEFAULT)
    }

    fn narrow() -> Promoter {
        Promoter::new(PromotionConfig::DEFAULT.with_x64(false))
    }

    struct Array(DType);

    impl HasDType for Array {
        fn dtype(&self) -> DType {
            self.0
        }
    }

    #[test]
    fn test_explicit_dtype() {
        let p = narrow();
        assert_eq!(p.dtype(&DType::Int64.into(), false).unwrap(), DType::Int64);
        assert_eq!(p.dtype(&DType::Int64.into(), true).unwrap(), DType::Int32);
    }

    #[test]
    fn test_literals_use_defaults() {
        let p = wide();
        assert_eq!(p.dtype(&Operand::from(true), false).unwrap(), DType::Bool);
        assert_eq!(p.dtype(&Operand::from(7i64), false).unwrap(), DType::Int64);
        assert_eq!(p.dtype(&Operand::from(0.5), false).unwrap(), DType::Float64);
        assert_eq!(
            p.dtype(&Operand::complex(1.0, -1.0), false).unwrap(),
            DType::Complex128
        );
        assert_eq!(
            narrow().dtype(&Operand::from(0.5), false).unwrap(),
            DType::Float32
        );
    }

    #[test]
    fn test_kinds_use_defaults() {
        let p = narrow();
        assert_eq!(p.dtype(&ScalarKind::Int.into(), false).unwrap(), DType::Int32);
        assert_eq!(p.dtype(&ScalarKind::Bool.into(), false).unwrap(), DType::Bool);
        assert_eq!(
            p.dtype(&ScalarKind::Complex.into(), false).unwrap(),
            DType::Complex64
        );
    }

    #[test]
    fn test_int_literal_overflow() {
        let big = Operand::from(1i128 << 31);
        let err = narrow().dtype(&big, false).unwrap_err();
        assert_eq!(
            err,
            XftError::Overflow {
                value: 1 << 31,
                dtype: DType::Int32
            }
        );
        assert_eq!(wide().dtype(&big, false).unwrap(), DType::Int64);
        let min = Operand::from(i64::MIN);
        assert_eq!(wide().dtype(&min, false).unwrap(), DType::Int64);
        assert!(wide().dtype(&Operand::from(1i128 << 63), false).is_err());
    }

    #[test]
    fn test_object_dtype() {
        let arr = Array(DType::Bfloat16);
        assert_eq!(
            wide().dtype(&Operand::object(&arr), true).unwrap(),
            DType::Bfloat16
        );
    }

    #[test]
    fn test_sequences() {
        let p = wide();
        assert_eq!(p.dtype(&Operand::Sequence(&[]), false).unwrap(), DType::Float64);
        let items = [Operand::from(1i64), Operand::from(2.5)];
        assert_eq!(
            p.dtype(&Operand::Sequence(&items), false).unwrap(),
            DType::Float64
        );
        let items = [DType::Int8.into(), DType::Uint8.into()];
        assert_eq!(
            p.dtype(&Operand::Sequence(&items), false).unwrap(),
            DType::Int16
        );
    }

    #[test]
    fn test_sequence_canonicalization_follows_flag() {
        let p = narrow();
        let items = [DType::Int64.into(), DType::Int8.into()];
        let seq = Operand::Sequence(&items);
        assert_eq!(p.dtype(&seq, false).unwrap(), DType::Int64);
        assert_eq!(p.dtype(&seq, true).unwrap(), DType::Int32);
        assert_eq!(p.dtype(&DType::Int64.into(), false).unwrap(), DType::Int64);
    }

    #[test]
    fn test_missing() {
        let err = wide().dtype(&Operand::Missing, false).unwrap_err();
        assert_eq!(err.to_string(), "Cannot infer dtype from None.");
    }
}
