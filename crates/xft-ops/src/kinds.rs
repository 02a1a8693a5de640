//! Kind predicates, category conversions and dtype metadata.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use xft_core::{DType, Limit, NativeType, Result, ScalarKind, XftError};

use crate::dtype_promotion::Promoter;

/// Array-API dtype kinds accepted by [`isdtype`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DTypeKind {
    Bool,
    SignedInteger,
    UnsignedInteger,
    Integral,
    RealFloating,
    ComplexFloating,
    Numeric,
}

impl DTypeKind {
    pub const ALL: [DTypeKind; 7] = [
        DTypeKind::Bool,
        DTypeKind::SignedInteger,
        DTypeKind::UnsignedInteger,
        DTypeKind::Integral,
        DTypeKind::RealFloating,
        DTypeKind::ComplexFloating,
        DTypeKind::Numeric,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DTypeKind::Bool => "bool",
            DTypeKind::SignedInteger => "signed integer",
            DTypeKind::UnsignedInteger => "unsigned integer",
            DTypeKind::Integral => "integral",
            DTypeKind::RealFloating => "real floating",
            DTypeKind::ComplexFloating => "complex floating",
            DTypeKind::Numeric => "numeric",
        }
    }

    pub fn contains(self, dt: DType) -> bool {
        match self {
            DTypeKind::Bool => dt.is_bool(),
            DTypeKind::SignedInteger => dt.is_signed_int(),
            DTypeKind::UnsignedInteger => dt.is_unsigned(),
            DTypeKind::Integral => dt.is_int(),
            DTypeKind::RealFloating => dt.is_float(),
            DTypeKind::ComplexFloating => dt.is_complex(),
            DTypeKind::Numeric => dt.is_numeric(),
        }
    }
}

impl fmt::Display for DTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DTypeKind {
    type Err = XftError;

    fn from_str(s: &str) -> Result<Self> {
        DTypeKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                let valid: Vec<String> = DTypeKind::ALL
                    .iter()
                    .map(|k| format!("'{}'", k.name()))
                    .collect();
                XftError::InvalidValue(format!(
                    "Unrecognized kind: '{s}'. Valid kinds: [{}]",
                    valid.join(", ")
                ))
            })
    }
}

/// What [`isdtype`] tests against.
#[derive(Clone, Copy, Debug)]
pub enum KindSpec<'a> {
    /// A kind name such as `"real floating"`.
    Name(&'a str),
    Kind(DTypeKind),
    /// Exact dtype identity.
    DType(DType),
    /// Matches if any member matches.
    AnyOf(&'a [KindSpec<'a>]),
}

impl<'a> From<&'a str> for KindSpec<'a> {
    fn from(name: &'a str) -> Self {
        KindSpec::Name(name)
    }
}

impl From<DTypeKind> for KindSpec<'_> {
    fn from(kind: DTypeKind) -> Self {
        KindSpec::Kind(kind)
    }
}

impl From<DType> for KindSpec<'_> {
    fn from(dt: DType) -> Self {
        KindSpec::DType(dt)
    }
}

impl<'a> From<&'a [KindSpec<'a>]> for KindSpec<'a> {
    fn from(specs: &'a [KindSpec<'a>]) -> Self {
        KindSpec::AnyOf(specs)
    }
}

/// Whether `dt` belongs to `kind`.
///
/// Members of an [`KindSpec::AnyOf`] are tried in order; an unknown kind
/// name is an error only if it is reached.
pub fn isdtype<'a>(dt: DType, kind: impl Into<KindSpec<'a>>) -> Result<bool> {
    matches_kind(dt, &kind.into())
}

fn matches_kind(dt: DType, spec: &KindSpec<'_>) -> Result<bool> {
    match *spec {
        KindSpec::Name(name) => Ok(name.parse::<DTypeKind>()?.contains(dt)),
        KindSpec::Kind(kind) => Ok(kind.contains(dt)),
        KindSpec::DType(other) => Ok(dt == other),
        KindSpec::AnyOf(specs) => {
            for spec in specs {
                if matches_kind(dt, spec)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// NumPy-style abstract scalar hierarchy for [`issubdtype`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbstractKind {
    Generic,
    Number,
    Integer,
    SignedInteger,
    UnsignedInteger,
    Floating,
    ComplexFloating,
}

impl AbstractKind {
    pub fn members(self) -> &'static [DType] {
        match self {
            AbstractKind::Generic | AbstractKind::Number => DType::ALL,
            AbstractKind::Integer => DType::INTS,
            AbstractKind::SignedInteger => DType::SINTS,
            AbstractKind::UnsignedInteger => DType::UINTS,
            AbstractKind::Floating => DType::FLOATS,
            AbstractKind::ComplexFloating => DType::COMPLEXES,
        }
    }
}

/// Right-hand side of [`issubdtype`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubdtypeTarget {
    Abstract(AbstractKind),
    DType(DType),
}

impl From<AbstractKind> for SubdtypeTarget {
    fn from(kind: AbstractKind) -> Self {
        SubdtypeTarget::Abstract(kind)
    }
}

impl From<DType> for SubdtypeTarget {
    fn from(dt: DType) -> Self {
        SubdtypeTarget::DType(dt)
    }
}

/// Whether `dt` is `target` or one of its members.
pub fn issubdtype(dt: DType, target: impl Into<SubdtypeTarget>) -> bool {
    match target.into() {
        SubdtypeTarget::Abstract(kind) => kind.members().contains(&dt),
        SubdtypeTarget::DType(other) => dt == other,
    }
}

/// Builtin literal kind whose values `dt` holds.
pub fn scalar_type(dt: DType) -> Result<ScalarKind> {
    if dt.is_bool() {
        Ok(ScalarKind::Bool)
    } else if dt.is_int() {
        Ok(ScalarKind::Int)
    } else if dt.is_float() {
        Ok(ScalarKind::Float)
    } else if dt.is_complex() {
        Ok(ScalarKind::Complex)
    } else {
        Err(XftError::InvalidDType(format!(
            "dtype {dt} has no literal scalar kind"
        )))
    }
}

pub fn is_string_dtype(dt: DType) -> bool {
    dt.is_string()
}

pub fn dtype_to_native(dt: DType) -> Result<NativeType> {
    dt.native().ok_or_else(|| {
        XftError::InvalidDType(format!("dtype {dt} has no native representation"))
    })
}

pub fn native_to_dtype(native: NativeType) -> Result<DType> {
    DType::from_native(native)
}

impl Promoter {
    /// Bool maps to the default int; numeric dtypes are unchanged.
    pub fn to_numeric(&self, dt: DType) -> DType {
        if dt.is_bool() {
            self.config.default_int()
        } else {
            dt
        }
    }

    /// Nearest inexact dtype: bool and integers become floats, 64-bit
    /// integers becoming `float64`.
    pub fn to_inexact(&self, dt: DType) -> DType {
        match dt {
            DType::Int64 | DType::Uint64 => DType::Float64,
            dt if dt.is_bool() || dt.is_int() => DType::Float32,
            dt => dt,
        }
    }

    /// Complex dtype wide enough for `dt`.
    pub fn to_complex(&self, dt: DType) -> DType {
        if dt.is_complex() {
            return dt;
        }
        match self.to_inexact(dt) {
            DType::Float64 => DType::Complex128,
            _ => DType::Complex64,
        }
    }
}

/// [`Promoter::to_numeric`] under the current configuration.
pub fn to_numeric(dt: DType) -> DType {
    Promoter::current().to_numeric(dt)
}

/// [`Promoter::to_inexact`] under the current configuration.
pub fn to_inexact(dt: DType) -> DType {
    Promoter::current().to_inexact(dt)
}

/// [`Promoter::to_complex`] under the current configuration.
pub fn to_complex(dt: DType) -> DType {
    Promoter::current().to_complex(dt)
}

/// Descriptive record for one dtype.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DTypeInfo {
    pub name: &'static str,
    pub short_name: String,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itemsize: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_signed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_inf: Option<bool>,
}

impl fmt::Display for DTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) priority={}", self.name, self.short_name, self.priority)?;
        if let Some(size) = self.itemsize {
            write!(f, " itemsize={size}")?;
        }
        if let Some(bits) = self.bit_width {
            write!(f, " bits={bits}")?;
        }
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            write!(f, " range=[{min}, {max}]")?;
        }
        if let Some(signed) = self.is_signed {
            write!(f, " signed={signed}")?;
        }
        if let Some(inf) = self.supports_inf {
            write!(f, " inf={inf}")?;
        }
        Ok(())
    }
}

/// Metadata for `dt`. Integers report their range and signedness; floats
/// and complexes report width and infinity support.
pub fn get_dtype_info(dt: DType) -> DTypeInfo {
    let mut info = DTypeInfo {
        name: dt.name(),
        short_name: dt.short_name(),
        priority: dt.priority(),
        itemsize: dt.itemsize(),
        min: None,
        max: None,
        bit_width: None,
        is_signed: None,
        supports_inf: None,
    };
    if dt.is_int() {
        info.min = dt.min().ok();
        info.max = dt.max().ok();
        info.bit_width = dt.bit_width().ok();
        info.is_signed = Some(dt.is_signed_int());
    } else if dt.is_float() {
        info.min = dt.min().ok();
        info.max = dt.max().ok();
        info.bit_width = dt.bit_width().ok();
        info.supports_inf = Some(dt.supports_inf());
    } else if dt.is_complex() {
        info.bit_width = dt.bit_width().ok();
        info.supports_inf = Some(dt.supports_inf());
    }
    info
}
