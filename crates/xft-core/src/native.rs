//! Native binary representation of dtypes.
//!
//! A `NativeType` describes the storage layout an array buffer uses for a
//! dtype: width and signedness for integers, exponent/mantissa layout for
//! floats. The mapping to `DType` is bijective (see `DType::from_native`).

use std::fmt;

/// How a float format spends its special encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatEncoding {
    /// IEEE 754 style: infinities and NaNs at the all-ones exponent.
    Ieee,
    /// No infinities; NaN at the all-ones pattern (`fn` suffix).
    FiniteNan,
    /// No infinities, no negative zero; NaN at the negative-zero pattern
    /// (`fnuz` suffix).
    FiniteNanUnsignedZero,
    /// Neither infinities nor NaNs.
    Finite,
}

impl FloatEncoding {
    pub fn has_inf(self) -> bool {
        matches!(self, FloatEncoding::Ieee)
    }

    pub fn has_nan(self) -> bool {
        !matches!(self, FloatEncoding::Finite)
    }
}

/// Bit layout of a real floating-point format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloatFormat {
    pub exponent_bits: u8,
    pub mantissa_bits: u8,
    pub exponent_bias: i16,
    pub signed: bool,
    pub encoding: FloatEncoding,
}

impl FloatFormat {
    pub const F16: FloatFormat = FloatFormat::signed(5, 10, 15, FloatEncoding::Ieee);
    pub const BF16: FloatFormat = FloatFormat::signed(8, 7, 127, FloatEncoding::Ieee);
    pub const F32: FloatFormat = FloatFormat::signed(8, 23, 127, FloatEncoding::Ieee);
    pub const F64: FloatFormat = FloatFormat::signed(11, 52, 1023, FloatEncoding::Ieee);

    pub const fn signed(
        exponent_bits: u8,
        mantissa_bits: u8,
        exponent_bias: i16,
        encoding: FloatEncoding,
    ) -> Self {
        Self {
            exponent_bits,
            mantissa_bits,
            exponent_bias,
            signed: true,
            encoding,
        }
    }

    pub const fn unsigned(
        exponent_bits: u8,
        mantissa_bits: u8,
        exponent_bias: i16,
        encoding: FloatEncoding,
    ) -> Self {
        Self {
            exponent_bits,
            mantissa_bits,
            exponent_bias,
            signed: false,
            encoding,
        }
    }

    /// Total storage bits including the sign bit, if any.
    pub fn bits(self) -> u32 {
        self.signed as u32 + self.exponent_bits as u32 + self.mantissa_bits as u32
    }
}

/// Concrete storage layout of a scalar element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bool,
    Int { bits: u8, signed: bool },
    Float(FloatFormat),
    /// Pair of real components sharing one format.
    Complex(FloatFormat),
}

impl NativeType {
    /// Storage bits (bool is stored in a full byte).
    pub fn bits(self) -> u32 {
        match self {
            NativeType::Bool => 8,
            NativeType::Int { bits, .. } => bits as u32,
            NativeType::Float(format) => format.bits(),
            NativeType::Complex(format) => 2 * format.bits(),
        }
    }

    /// Bytes per element, rounding sub-byte formats up to one byte.
    pub fn byte_width(self) -> usize {
        (self.bits() as usize).div_ceil(8)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Bool => write!(f, "bool"),
            NativeType::Int { bits, signed } => {
                write!(f, "{}{bits}", if *signed { "i" } else { "u" })
            }
            NativeType::Float(fmt_) => write!(
                f,
                "f{}(e{}m{}, bias {}, {:?})",
                fmt_.bits(),
                fmt_.exponent_bits,
                fmt_.mantissa_bits,
                fmt_.exponent_bias,
                fmt_.encoding
            ),
            NativeType::Complex(fmt_) => write!(f, "c{}", 2 * fmt_.bits()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_bits() {
        assert_eq!(FloatFormat::F16.bits(), 16);
        assert_eq!(FloatFormat::BF16.bits(), 16);
        assert_eq!(FloatFormat::F32.bits(), 32);
        assert_eq!(FloatFormat::F64.bits(), 64);
        assert_eq!(
            FloatFormat::unsigned(8, 0, 127, FloatEncoding::FiniteNan).bits(),
            8
        );
    }

    #[test]
    fn test_byte_width_rounds_up() {
        let i4 = NativeType::Int {
            bits: 4,
            signed: true,
        };
        assert_eq!(i4.byte_width(), 1);
        assert_eq!(NativeType::Bool.byte_width(), 1);
        assert_eq!(NativeType::Complex(FloatFormat::F32).byte_width(), 8);
    }

    #[test]
    fn test_f16_and_bf16_are_distinct() {
        assert_ne!(FloatFormat::F16, FloatFormat::BF16);
        assert_eq!(FloatFormat::F16.bits(), FloatFormat::BF16.bits());
    }

    #[test]
    fn test_display() {
        let u8_ = NativeType::Int {
            bits: 8,
            signed: false,
        };
        assert_eq!(u8_.to_string(), "u8");
        assert_eq!(NativeType::Complex(FloatFormat::F64).to_string(), "c128");
    }
}
