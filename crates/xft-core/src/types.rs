//! The dtype catalog: identity, priority, categories and numeric limits.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::native::{FloatEncoding, FloatFormat, NativeType};
use crate::{Result, XftError};

/// Supported scalar element types.
///
/// Variants are declared in priority order. Priority is a display and
/// ordering hint only; promotion never consults it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int2,
    Uint2,
    Int4,
    Uint4,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float4E2m1fn,
    Float8E3m4,
    Float8E4m3,
    Float8E5m2,
    Float8E4m3fn,
    Float8E8m0fnu,
    Float8E4m3b11fnuz,
    Float8E4m3fnuz,
    Float8E5m2fnuz,
    Float16,
    Bfloat16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

/// Disjoint category every dtype belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Bool,
    SignedInt,
    UnsignedInt,
    Float,
    Complex,
    String,
}

/// A representable extreme of a numeric dtype.
///
/// Infinite floats serialize as the strings `"inf"` and `"-inf"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Limit {
    Bool(bool),
    Int(i128),
    Float(f64),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Bool(b) => write!(f, "{b}"),
            Limit::Int(i) => write!(f, "{i}"),
            Limit::Float(x) => write!(f, "{x}"),
        }
    }
}

use DType::*;

impl DType {
    pub const SINTS: &'static [DType] = &[Int2, Int4, Int8, Int16, Int32, Int64];
    pub const UINTS: &'static [DType] = &[Uint2, Uint4, Uint8, Uint16, Uint32, Uint64];
    pub const INTS: &'static [DType] = &[
        Int2, Int4, Int8, Int16, Int32, Int64, Uint2, Uint4, Uint8, Uint16, Uint32, Uint64,
    ];
    pub const FP4S: &'static [DType] = &[Float4E2m1fn];
    pub const FP8S: &'static [DType] = &[
        Float8E3m4,
        Float8E4m3,
        Float8E5m2,
        Float8E4m3fn,
        Float8E8m0fnu,
        Float8E4m3b11fnuz,
        Float8E4m3fnuz,
        Float8E5m2fnuz,
    ];
    pub const FLOATS: &'static [DType] = &[
        Float4E2m1fn,
        Float8E3m4,
        Float8E4m3,
        Float8E5m2,
        Float8E4m3fn,
        Float8E8m0fnu,
        Float8E4m3b11fnuz,
        Float8E4m3fnuz,
        Float8E5m2fnuz,
        Float16,
        Bfloat16,
        Float32,
        Float64,
    ];
    pub const COMPLEXES: &'static [DType] = &[Complex64, Complex128];
    pub const STRING_TYPES: &'static [DType] = &[String];
    /// Narrow float formats outside IEEE binary16/32/64.
    pub const CUSTOM_FPS: &'static [DType] = &[
        Float4E2m1fn,
        Float8E3m4,
        Float8E4m3,
        Float8E5m2,
        Float8E4m3fn,
        Float8E8m0fnu,
        Float8E4m3b11fnuz,
        Float8E4m3fnuz,
        Float8E5m2fnuz,
        Bfloat16,
    ];
    pub const CUSTOM_INTS: &'static [DType] = &[Int2, Int4, Uint4, Uint2];
    /// Formats that cannot encode infinity.
    pub const NO_INF: &'static [DType] = &[
        Float4E2m1fn,
        Float8E4m3fn,
        Float8E4m3b11fnuz,
        Float8E4m3fnuz,
        Float8E5m2fnuz,
        Float8E8m0fnu,
    ];

    /// Every numeric dtype plus bool, in priority order. String is excluded.
    pub const ALL: &'static [DType] = &[
        Bool,
        Int2,
        Uint2,
        Int4,
        Uint4,
        Int8,
        Uint8,
        Int16,
        Uint16,
        Int32,
        Uint32,
        Int64,
        Uint64,
        Float4E2m1fn,
        Float8E3m4,
        Float8E4m3,
        Float8E5m2,
        Float8E4m3fn,
        Float8E8m0fnu,
        Float8E4m3b11fnuz,
        Float8E4m3fnuz,
        Float8E5m2fnuz,
        Float16,
        Bfloat16,
        Float32,
        Float64,
        Complex64,
        Complex128,
    ];

    /// The full catalog, string included.
    pub const CATALOG: &'static [DType] = &[
        Bool,
        Int2,
        Uint2,
        Int4,
        Uint4,
        Int8,
        Uint8,
        Int16,
        Uint16,
        Int32,
        Uint32,
        Int64,
        Uint64,
        Float4E2m1fn,
        Float8E3m4,
        Float8E4m3,
        Float8E5m2,
        Float8E4m3fn,
        Float8E8m0fnu,
        Float8E4m3b11fnuz,
        Float8E4m3fnuz,
        Float8E5m2fnuz,
        Float16,
        Bfloat16,
        Float32,
        Float64,
        Complex64,
        Complex128,
        String,
    ];

    /// Unique name, e.g. `float8_e4m3fn`.
    pub fn name(self) -> &'static str {
        match self {
            Bool => "bool",
            Int2 => "int2",
            Uint2 => "uint2",
            Int4 => "int4",
            Uint4 => "uint4",
            Int8 => "int8",
            Uint8 => "uint8",
            Int16 => "int16",
            Uint16 => "uint16",
            Int32 => "int32",
            Uint32 => "uint32",
            Int64 => "int64",
            Uint64 => "uint64",
            Float4E2m1fn => "float4_e2m1fn",
            Float8E3m4 => "float8_e3m4",
            Float8E4m3 => "float8_e4m3",
            Float8E5m2 => "float8_e5m2",
            Float8E4m3fn => "float8_e4m3fn",
            Float8E8m0fnu => "float8_e8m0fnu",
            Float8E4m3b11fnuz => "float8_e4m3b11fnuz",
            Float8E4m3fnuz => "float8_e4m3fnuz",
            Float8E5m2fnuz => "float8_e5m2fnuz",
            Float16 => "float16",
            Bfloat16 => "bfloat16",
            Float32 => "float32",
            Float64 => "float64",
            Complex64 => "complex64",
            Complex128 => "complex128",
            String => "string",
        }
    }

    /// Total-order rank used for display and tie-breaking.
    pub fn priority(self) -> i32 {
        match self {
            Bool => 0,
            Int2 => 4,
            Uint2 => 5,
            Int4 => 6,
            Uint4 => 7,
            Int8 => 8,
            Uint8 => 9,
            Int16 => 10,
            Uint16 => 11,
            Int32 => 12,
            Uint32 => 13,
            Int64 => 14,
            Uint64 => 15,
            Float4E2m1fn => 16,
            Float8E3m4 => 17,
            Float8E4m3 => 18,
            Float8E5m2 => 19,
            Float8E4m3fn => 20,
            Float8E8m0fnu => 21,
            Float8E4m3b11fnuz => 22,
            Float8E4m3fnuz => 23,
            Float8E5m2fnuz => 24,
            Float16 => 25,
            Bfloat16 => 26,
            Float32 => 27,
            Float64 => 28,
            Complex64 => 30,
            Complex128 => 32,
            String => 40,
        }
    }

    /// Abbreviated name: `f32` for `float32`, `u8` for `uint8`.
    pub fn short_name(self) -> std::string::String {
        self.name()
            .replace("float", "f")
            .replace("uint", "u")
            .replace("int", "i")
            .replace("complex", "c")
    }

    // ── Categories ──────────────────────────────────────────────────────

    pub fn is_bool(self) -> bool {
        self == Bool
    }

    /// Integer check. The priority window is a fast path; membership in
    /// `INTS` is authoritative.
    pub fn is_int(self) -> bool {
        (4..=15).contains(&self.priority()) && Self::INTS.contains(&self)
    }

    pub fn is_unsigned(self) -> bool {
        Self::UINTS.contains(&self)
    }

    pub fn is_signed_int(self) -> bool {
        Self::SINTS.contains(&self)
    }

    /// Floating-point check (real formats only).
    pub fn is_float(self) -> bool {
        (16..=28).contains(&self.priority()) && Self::FLOATS.contains(&self)
    }

    pub fn is_complex(self) -> bool {
        Self::COMPLEXES.contains(&self)
    }

    pub fn is_string(self) -> bool {
        Self::STRING_TYPES.contains(&self)
    }

    pub fn is_numeric(self) -> bool {
        self.is_int() || self.is_float() || self.is_complex()
    }

    pub fn category(self) -> Category {
        if self.is_bool() {
            Category::Bool
        } else if self.is_signed_int() {
            Category::SignedInt
        } else if self.is_unsigned() {
            Category::UnsignedInt
        } else if self.is_float() {
            Category::Float
        } else if self.is_complex() {
            Category::Complex
        } else {
            Category::String
        }
    }

    // ── Native representation ───────────────────────────────────────────

    /// Concrete binary layout, or `None` for string.
    pub fn native(self) -> Option<NativeType> {
        let int = |bits, signed| Some(NativeType::Int { bits, signed });
        let float = |format| Some(NativeType::Float(format));
        match self {
            Bool => Some(NativeType::Bool),
            Int2 => int(2, true),
            Uint2 => int(2, false),
            Int4 => int(4, true),
            Uint4 => int(4, false),
            Int8 => int(8, true),
            Uint8 => int(8, false),
            Int16 => int(16, true),
            Uint16 => int(16, false),
            Int32 => int(32, true),
            Uint32 => int(32, false),
            Int64 => int(64, true),
            Uint64 => int(64, false),
            Float4E2m1fn => float(FloatFormat::signed(2, 1, 1, FloatEncoding::Finite)),
            Float8E3m4 => float(FloatFormat::signed(3, 4, 3, FloatEncoding::Ieee)),
            Float8E4m3 => float(FloatFormat::signed(4, 3, 7, FloatEncoding::Ieee)),
            Float8E5m2 => float(FloatFormat::signed(5, 2, 15, FloatEncoding::Ieee)),
            Float8E4m3fn => float(FloatFormat::signed(4, 3, 7, FloatEncoding::FiniteNan)),
            Float8E8m0fnu => float(FloatFormat::unsigned(8, 0, 127, FloatEncoding::FiniteNan)),
            Float8E4m3b11fnuz => {
                float(FloatFormat::signed(4, 3, 11, FloatEncoding::FiniteNanUnsignedZero))
            }
            Float8E4m3fnuz => {
                float(FloatFormat::signed(4, 3, 8, FloatEncoding::FiniteNanUnsignedZero))
            }
            Float8E5m2fnuz => {
                float(FloatFormat::signed(5, 2, 16, FloatEncoding::FiniteNanUnsignedZero))
            }
            Float16 => float(FloatFormat::F16),
            Bfloat16 => float(FloatFormat::BF16),
            Float32 => float(FloatFormat::F32),
            Float64 => float(FloatFormat::F64),
            Complex64 => Some(NativeType::Complex(FloatFormat::F32)),
            Complex128 => Some(NativeType::Complex(FloatFormat::F64)),
            String => None,
        }
    }

    /// Inverse of [`DType::native`]. Exactly one dtype maps to each layout.
    pub fn from_native(native: NativeType) -> Result<DType> {
        Self::CATALOG
            .iter()
            .copied()
            .find(|dt| dt.native() == Some(native))
            .ok_or_else(|| {
                XftError::InvalidDType(format!(
                    "Native type {native} is not a supported xft DType."
                ))
            })
    }

    /// Size in bytes of a single element. Sub-byte formats occupy one byte.
    pub fn itemsize(self) -> Option<usize> {
        self.native().map(NativeType::byte_width)
    }

    // ── Numeric limits ──────────────────────────────────────────────────

    pub fn bit_width(self) -> Result<u32> {
        match self.native() {
            Some(NativeType::Bool) => Ok(8),
            Some(native) => Ok(native.bits()),
            None => Err(non_numeric("bit_width", self)),
        }
    }

    pub fn supports_inf(self) -> bool {
        if Self::NO_INF.contains(&self) {
            return false;
        }
        self.is_float() || self.is_complex()
    }

    /// Smallest representable value.
    ///
    /// Floats report negative infinity, except the formats listed in
    /// [`DType::NO_INF`] which report their lowest finite value.
    pub fn min(self) -> Result<Limit> {
        if self.is_bool() {
            return Ok(Limit::Bool(false));
        }
        if self.is_int() {
            return Ok(Limit::Int(self.int_range().0));
        }
        if self.is_float() {
            return Ok(Limit::Float(match finite_extremes(self) {
                Some((lo, _)) => lo,
                None => f64::NEG_INFINITY,
            }));
        }
        Err(non_numeric("min value", self))
    }

    /// Largest representable value.
    pub fn max(self) -> Result<Limit> {
        if self.is_bool() {
            return Ok(Limit::Bool(true));
        }
        if self.is_int() {
            return Ok(Limit::Int(self.int_range().1));
        }
        if self.is_float() {
            return Ok(Limit::Float(match finite_extremes(self) {
                Some((_, hi)) => hi,
                None => f64::INFINITY,
            }));
        }
        Err(non_numeric("max value", self))
    }

    /// Inclusive integer range. Only meaningful for integer dtypes.
    pub fn int_range(self) -> (i128, i128) {
        match self.native() {
            Some(NativeType::Int { bits, signed: true }) => {
                let half = 1i128 << (bits - 1);
                (-half, half - 1)
            }
            Some(NativeType::Int {
                bits,
                signed: false,
            }) => (0, (1i128 << bits) - 1),
            _ => (0, 0),
        }
    }
}

/// Lowest/highest finite values of the formats without infinity.
fn finite_extremes(dt: DType) -> Option<(f64, f64)> {
    match dt {
        Float4E2m1fn => Some((-6.0, 6.0)),
        Float8E4m3fn => Some((-448.0, 448.0)),
        Float8E4m3b11fnuz => Some((-30.0, 30.0)),
        Float8E4m3fnuz => Some((-240.0, 240.0)),
        Float8E5m2fnuz => Some((-57344.0, 57344.0)),
        // Unsigned: the lowest value is the smallest power of two.
        Float8E8m0fnu => Some((2f64.powi(-127), 2f64.powi(127))),
        _ => None,
    }
}

fn non_numeric(what: &str, dt: DType) -> XftError {
    let kind = if dt.is_complex() {
        "complex"
    } else {
        "non-numeric"
    };
    XftError::InvalidDType(format!("{what} is not defined for {kind} dtype {dt}"))
}

impl PartialOrd for DType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Limit::Bool(b) => serializer.serialize_bool(b),
            Limit::Int(i) => serializer.serialize_i128(i),
            Limit::Float(x) if x.is_infinite() => {
                serializer.serialize_str(if x > 0.0 { "inf" } else { "-inf" })
            }
            Limit::Float(x) => serializer.serialize_f64(x),
        }
    }
}

impl Serialize for DType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl FromStr for DType {
    type Err = XftError;

    /// Accepts canonical names, short names (`f32`, `u8`), and the
    /// NumPy aliases `bool_`, `half`, `single`, `double`.
    fn from_str(s: &str) -> Result<Self> {
        let alias = match s {
            "bool_" => Some(Bool),
            "half" => Some(Float16),
            "single" => Some(Float32),
            "double" => Some(Float64),
            _ => None,
        };
        if let Some(dt) = alias {
            return Ok(dt);
        }
        Self::CATALOG
            .iter()
            .copied()
            .find(|dt| dt.name() == s || dt.short_name() == s)
            .ok_or_else(|| {
                XftError::InvalidDType(format!("Cannot convert value {s} to a valid xft DType."))
            })
    }
}

/// Anything that can be resolved to a catalog dtype.
pub trait ToDType {
    fn to_dtype(&self) -> Result<DType>;
}

impl ToDType for DType {
    fn to_dtype(&self) -> Result<DType> {
        Ok(*self)
    }
}

impl ToDType for str {
    fn to_dtype(&self) -> Result<DType> {
        self.parse()
    }
}

impl ToDType for std::string::String {
    fn to_dtype(&self) -> Result<DType> {
        self.parse()
    }
}

impl ToDType for NativeType {
    fn to_dtype(&self) -> Result<DType> {
        DType::from_native(*self)
    }
}

impl<T: ToDType + ?Sized> ToDType for &T {
    fn to_dtype(&self) -> Result<DType> {
        (**self).to_dtype()
    }
}
