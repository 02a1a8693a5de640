//! Binary and n-ary dtype promotion.
//!
//! Results are resolved on the lattice selected by the promotion mode. A
//! weak result node resolves to the current default dtype of its kind.
//!
//! All operations are methods on [`Promoter`], which carries an explicit
//! [`PromotionConfig`]. The free functions read the process-wide config.

use smallvec::SmallVec;
use tracing::trace;
use xft_core::{
    DType, Operand, PromotionConfig, PromotionMode, Result, WeakKind, XftError, current_config,
};

use crate::lattice::{Lattice, Node, lattice, lattice_node};
use crate::lub::least_upper_bound;

/// Promotion operations bound to one configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Promoter {
    pub config: PromotionConfig,
}

impl Promoter {
    pub fn new(config: PromotionConfig) -> Self {
        Self { config }
    }

    /// A promoter snapshotting the process-wide configuration.
    pub fn current() -> Self {
        Self::new(current_config())
    }

    pub fn mode(&self) -> PromotionMode {
        self.config.mode
    }

    pub fn lattice(&self) -> Result<&'static Lattice> {
        lattice(self.config.mode)
    }

    /// Concrete dtype for a lattice node.
    pub fn node_dtype(&self, node: Node) -> DType {
        match node {
            Node::DType(dt) => dt,
            Node::Weak(WeakKind::Int) => self.config.default_int(),
            Node::Weak(WeakKind::Float) => self.config.default_float(),
            Node::Weak(WeakKind::Complex) => self.config.default_complex(),
        }
    }

    /// Least upper bound of two dtypes or weak kinds.
    ///
    /// The result is not canonicalized.
    pub fn promote_types(&self, a: impl Into<Node>, b: impl Into<Node>) -> Result<DType> {
        let (a, b) = (a.into(), b.into());
        let node = least_upper_bound(self.lattice()?, &[a, b])?;
        trace!(%a, %b, result = %node, mode = %self.config.mode, "promote_types");
        Ok(self.node_dtype(node))
    }

    /// Canonical dtype that `args` promote to.
    pub fn result_type(&self, args: &[Operand<'_>]) -> Result<DType> {
        self.result_type_weak(args).map(|(dt, _)| dt)
    }

    /// Like [`Promoter::result_type`], also reporting whether the result is
    /// weakly typed.
    pub fn result_type_weak(&self, args: &[Operand<'_>]) -> Result<(DType, bool)> {
        if args.is_empty() {
            return Err(XftError::InvalidValue(
                "result_type() requires at least one argument".into(),
            ));
        }
        let (dtype, weak) = self.uncanonical_result_type(args)?;
        Ok((self.canonicalize_dtype(dtype), weak))
    }

    pub(crate) fn uncanonical_result_type(&self, args: &[Operand<'_>]) -> Result<(DType, bool)> {
        let typed = args
            .iter()
            .map(|arg| self.dtype_and_weak(arg))
            .collect::<Result<SmallVec<[(DType, bool); 4]>>>()?;

        if let [(dtype, weak)] = typed.as_slice() {
            return Ok((*dtype, *weak));
        }

        let first = typed[0].0;
        let all_weak = typed.iter().all(|&(_, weak)| weak);
        if !all_weak && typed.iter().all(|&(dt, _)| dt == first) {
            return Ok((first, false));
        }

        // All-weak arguments in standard mode join on their concrete dtypes
        // and the result stays weak.
        let weak_join = all_weak && self.config.mode != PromotionMode::Strict;
        let nodes: SmallVec<[Node; 4]> = typed
            .iter()
            .map(|&(dt, weak)| lattice_node(dt, weak && !weak_join))
            .collect();
        let node = least_upper_bound(self.lattice()?, &nodes)?;
        let dtype = self.node_dtype(node);
        let weak = weak_join || node.is_weak();
        Ok((dtype, weak && dtype != DType::Bool))
    }

    /// Whether every value of `from` can be represented in `to` without the
    /// promotion rules changing it.
    ///
    /// Both dtypes are canonicalized first. A pair with no promotion path
    /// is not castable; a dtype outside the lattice is an error.
    pub fn can_cast_safely(&self, from: DType, to: DType) -> Result<bool> {
        let from = self.canonicalize_dtype(from);
        let to = self.canonicalize_dtype(to);
        if from == to {
            return Ok(true);
        }
        match self.promote_types(from, to) {
            Ok(promoted) => Ok(promoted == to),
            Err(err) if err.is_promotion_error() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether `result_type(args)` succeeds.
    pub fn compatible_dtypes(&self, args: &[Operand<'_>]) -> bool {
        self.result_type(args).is_ok()
    }
}

/// [`Promoter::promote_types`] under the current configuration.
pub fn promote_types(a: impl Into<Node>, b: impl Into<Node>) -> Result<DType> {
    Promoter::current().promote_types(a, b)
}

/// [`Promoter::result_type`] under the current configuration.
pub fn result_type(args: &[Operand<'_>]) -> Result<DType> {
    Promoter::current().result_type(args)
}

/// [`Promoter::result_type_weak`] under the current configuration.
pub fn result_type_weak(args: &[Operand<'_>]) -> Result<(DType, bool)> {
    Promoter::current().result_type_weak(args)
}

/// [`Promoter::can_cast_safely`] under the current configuration.
pub fn can_cast_safely(from: DType, to: DType) -> Result<bool> {
    Promoter::current().can_cast_safely(from, to)
}

/// [`Promoter::compatible_dtypes`] under the current configuration.
pub fn compatible_dtypes(args: &[Operand<'_>]) -> bool {
    Promoter::current().compatible_dtypes(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xft_core::{HasDType, ScalarKind, register_weak_type};

    fn standard() -> Promoter {
        Promoter::new(PromotionConfig::DEFAULT)
    }

    fn strict() -> Promoter {
        Promoter::new(PromotionConfig::DEFAULT.with_mode(PromotionMode::Strict))
    }

    fn narrow() -> Promoter {
        Promoter::new(PromotionConfig::DEFAULT.with_x64(false))
    }

    #[test]
    fn test_same_dtype() {
        let p = standard();
        for &dt in DType::ALL {
            assert_eq!(p.promote_types(dt, dt).unwrap(), dt);
        }
    }

    #[test]
    fn test_integer_promotion() {
        let p = standard();
        assert_eq!(p.promote_types(DType::Int8, DType::Uint8).unwrap(), DType::Int16);
        assert_eq!(p.promote_types(DType::Uint8, DType::Uint16).unwrap(), DType::Uint16);
        assert_eq!(p.promote_types(DType::Int8, DType::Uint16).unwrap(), DType::Int32);
        assert_eq!(p.promote_types(DType::Int32, DType::Uint32).unwrap(), DType::Int64);
        assert_eq!(p.promote_types(DType::Int64, DType::Uint64).unwrap(), DType::Float64);
    }

    #[test]
    fn test_float_promotion() {
        let p = standard();
        assert_eq!(p.promote_types(DType::Float16, DType::Bfloat16).unwrap(), DType::Float32);
        assert_eq!(p.promote_types(DType::Float32, DType::Float64).unwrap(), DType::Float64);
        assert_eq!(p.promote_types(DType::Complex64, DType::Float64).unwrap(), DType::Complex128);
    }

    #[test]
    fn test_int_float_promotion() {
        let p = standard();
        assert_eq!(p.promote_types(DType::Int64, DType::Float16).unwrap(), DType::Float16);
        assert_eq!(p.promote_types(DType::Uint8, DType::Bfloat16).unwrap(), DType::Bfloat16);
        assert_eq!(p.promote_types(DType::Bool, DType::Int8).unwrap(), DType::Int8);
    }

    #[test]
    fn test_weak_kinds() {
        let p = standard();
        assert_eq!(p.promote_types(ScalarKind::Bool, ScalarKind::Int).unwrap(), DType::Int64);
        assert_eq!(p.promote_types(ScalarKind::Int, ScalarKind::Float).unwrap(), DType::Float64);
        assert_eq!(p.promote_types(DType::Int2, ScalarKind::Int).unwrap(), DType::Int2);
        assert_eq!(p.promote_types(ScalarKind::Complex, DType::Float32).unwrap(), DType::Complex64);
        assert_eq!(
            p.promote_types(ScalarKind::Complex, DType::Float64).unwrap(),
            DType::Complex128
        );
        assert_eq!(
            p.promote_types(DType::Float8E4m3fn, ScalarKind::Float).unwrap(),
            DType::Float8E4m3fn
        );
        assert_eq!(
            narrow().promote_types(ScalarKind::Int, ScalarKind::Float).unwrap(),
            DType::Float32
        );
    }

    #[test]
    fn test_promote_types_is_not_canonicalized() {
        let p = narrow();
        assert_eq!(p.promote_types(DType::Int64, DType::Int8).unwrap(), DType::Int64);
    }

    #[test]
    fn test_custom_formats_do_not_mix() {
        let p = standard();
        assert!(p.promote_types(DType::Uint2, DType::Uint8).is_err());
        assert!(p.promote_types(DType::Float8E4m3fn, DType::Bfloat16).is_err());
        let err = p
            .promote_types(DType::Float8E4m3fn, DType::Float32)
            .unwrap_err();
        assert!(err.is_promotion_error());
    }

    #[test]
    fn test_strict_mode() {
        let p = strict();
        assert!(p.promote_types(DType::Int32, DType::Float32).is_err());
        assert!(p.promote_types(DType::Int8, DType::Int16).is_err());
        assert_eq!(p.promote_types(DType::Int32, ScalarKind::Int).unwrap(), DType::Int32);
        assert_eq!(p.promote_types(ScalarKind::Int, DType::Float32).unwrap(), DType::Float32);
        assert_eq!(p.promote_types(DType::Bool, DType::Float32).unwrap(), DType::Float32);
    }

    #[test]
    fn test_string_is_invalid() {
        let err = standard()
            .promote_types(DType::String, DType::Int8)
            .unwrap_err();
        assert!(matches!(err, XftError::InvalidDType(_)));
    }

    #[test]
    fn test_result_type_nary() {
        let p = standard();
        let args = [DType::Int16.into(), DType::Int64.into(), DType::Bool.into()];
        assert_eq!(p.result_type(&args).unwrap(), DType::Int64);
    }

    #[test]
    fn test_result_type_single_argument() {
        let p = standard();
        assert_eq!(
            p.result_type_weak(&[Operand::from(3i64)]).unwrap(),
            (DType::Int64, true)
        );
        assert_eq!(
            p.result_type_weak(&[DType::Uint8.into()]).unwrap(),
            (DType::Uint8, false)
        );
    }

    #[test]
    fn test_weak_float_defers_to_half() {
        let p = standard();
        let args = [DType::Float16.into(), Operand::from(1.5), DType::Float16.into()];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Float16, false));
    }

    #[test]
    fn test_weak_scalar_absorbed() {
        let p = standard();
        let args = [Operand::from(2i64), DType::Float32.into()];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Float32, false));
        let args = [Operand::from(2.5), DType::Int8.into()];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Float64, true));
    }

    #[test]
    fn test_all_weak() {
        let p = standard();
        let args = [Operand::from(1i64), Operand::from(2i64)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Int64, true));
        let args = [Operand::from(1i64), Operand::from(2.0)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Float64, true));
        let args = [Operand::from(1i64), Operand::complex(0.0, 1.0)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Complex128, true));
    }

    #[test]
    fn test_bool_literal_is_strong() {
        let p = standard();
        let args = [Operand::from(true), Operand::from(false)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Bool, false));
        let args = [Operand::from(true), Operand::from(3i64)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Int64, true));
    }

    #[test]
    fn test_result_type_canonicalizes() {
        let p = narrow();
        let args = [DType::Int64.into(), DType::Int8.into()];
        assert_eq!(p.result_type(&args).unwrap(), DType::Int32);
        let args = [Operand::from(1i64), Operand::from(0.5)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Float32, true));
    }

    #[test]
    fn test_result_type_errors() {
        let p = standard();
        assert!(matches!(
            p.result_type(&[]).unwrap_err(),
            XftError::InvalidValue(_)
        ));
        let args = [DType::Uint4.into(), DType::Int4.into()];
        assert!(p.result_type(&args).unwrap_err().is_promotion_error());
        let args = [Operand::Missing, DType::Int8.into()];
        assert!(matches!(
            p.result_type(&args).unwrap_err(),
            XftError::InvalidValue(_)
        ));
    }

    #[test]
    fn test_strict_weak_literals() {
        let p = strict();
        let args = [Operand::from(1i64), DType::Int16.into()];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Int16, false));
        let args = [DType::Int16.into(), DType::Int32.into()];
        assert!(p.result_type(&args).is_err());
    }

    struct WeakBool;

    impl HasDType for WeakBool {
        fn dtype(&self) -> DType {
            DType::Bool
        }
    }

    struct WeakHalf;

    impl HasDType for WeakHalf {
        fn dtype(&self) -> DType {
            DType::Float16
        }
    }

    #[test]
    fn test_registered_weak_bool_is_strong() {
        register_weak_type::<WeakBool>();
        let (a, b) = (WeakBool, WeakBool);
        let args = [Operand::object(&a), Operand::object(&b)];
        assert_eq!(standard().result_type_weak(&args).unwrap(), (DType::Bool, false));
    }

    #[test]
    fn test_registered_weak_object_defers() {
        register_weak_type::<WeakHalf>();
        let x = WeakHalf;
        let args = [Operand::object(&x), DType::Bfloat16.into()];
        assert_eq!(standard().result_type_weak(&args).unwrap(), (DType::Bfloat16, false));
    }

    struct WeakByte;

    impl HasDType for WeakByte {
        fn dtype(&self) -> DType {
            DType::Int8
        }
    }

    #[test]
    fn test_registered_weak_pair_keeps_dtype() {
        register_weak_type::<WeakHalf>();
        register_weak_type::<WeakByte>();
        let p = standard();
        let (a, b) = (WeakHalf, WeakHalf);
        assert_eq!(
            p.result_type_weak(&[Operand::object(&a)]).unwrap(),
            (DType::Float16, true)
        );
        let args = [Operand::object(&a), Operand::object(&b)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Float16, true));
        let (x, y) = (WeakByte, WeakByte);
        let args = [Operand::object(&x), Operand::object(&y)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Int8, true));
        let args = [Operand::object(&x), Operand::from(3i64)];
        assert_eq!(p.result_type_weak(&args).unwrap(), (DType::Int64, true));
    }

    #[test]
    fn test_can_cast_safely() {
        let p = standard();
        assert!(p.can_cast_safely(DType::Int8, DType::Int16).unwrap());
        assert!(!p.can_cast_safely(DType::Int16, DType::Int8).unwrap());
        assert!(!p.can_cast_safely(DType::Float8E4m3fn, DType::Bfloat16).unwrap());
        assert!(p.can_cast_safely(DType::Bool, DType::Complex128).unwrap());
        assert!(p.can_cast_safely(DType::Float32, DType::Float32).unwrap());
        assert!(p.can_cast_safely(DType::String, DType::Int8).is_err());
    }

    #[test]
    fn test_can_cast_canonicalizes() {
        // int64 and int32 coincide once x64 is off.
        let p = narrow();
        assert!(p.can_cast_safely(DType::Int64, DType::Int32).unwrap());
        assert!(!standard().can_cast_safely(DType::Int64, DType::Int32).unwrap());
    }

    #[test]
    fn test_compatible_dtypes() {
        let p = standard();
        assert!(p.compatible_dtypes(&[DType::Int8.into(), DType::Float32.into()]));
        assert!(!p.compatible_dtypes(&[DType::Uint2.into(), DType::Float32.into()]));
        assert!(!p.compatible_dtypes(&[]));
        assert!(!strict().compatible_dtypes(&[DType::Int8.into(), DType::Float32.into()]));
    }
}
