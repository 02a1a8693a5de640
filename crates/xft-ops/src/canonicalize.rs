//! Precision canonicalization and user dtype validation.

use std::fmt;

use tracing::warn;
use xft_core::{DType, Result, ToDType, XftError};

use crate::dtype_promotion::Promoter;

/// Narrow a 64-bit dtype to its 32-bit counterpart when `x64` is off.
pub fn canonicalize_dtype_for(x64: bool, dtype: DType) -> DType {
    if x64 {
        return dtype;
    }
    match dtype {
        DType::Int64 => DType::Int32,
        DType::Uint64 => DType::Uint32,
        DType::Float64 => DType::Float32,
        DType::Complex128 => DType::Complex64,
        other => other,
    }
}

/// A user-provided dtype that does not survive canonicalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DowncastWarning {
    pub original: DType,
    pub canonical: DType,
    pub argument: Option<String>,
}

impl fmt::Display for DowncastWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User-provided dtype '{}'", self.original)?;
        if let Some(name) = &self.argument {
            write!(f, " for '{name}'")?;
        }
        write!(
            f,
            " is not available in current x64 mode and will be truncated to '{}'.",
            self.canonical
        )
    }
}

impl Promoter {
    pub fn canonicalize_dtype(&self, dtype: DType) -> DType {
        canonicalize_dtype_for(self.config.x64, dtype)
    }

    /// Validate and canonicalize a user-supplied dtype without logging.
    ///
    /// `name` labels the argument in error and warning messages.
    pub fn check_user_dtype<D>(
        &self,
        dtype: Option<D>,
        name: Option<&str>,
    ) -> Result<(DType, Option<DowncastWarning>)>
    where
        D: ToDType + fmt::Display,
    {
        let Some(raw) = dtype else {
            let mut msg = "dtype cannot be None.".to_string();
            if let Some(name) = name {
                msg.push_str(&format!(" Please provide a value for '{name}'."));
            }
            return Err(XftError::InvalidValue(msg));
        };

        let original = raw.to_dtype().map_err(|_| {
            let mut msg = format!("'{raw}' is not a valid xft dtype");
            if let Some(name) = name {
                msg.push_str(&format!(" for argument '{name}'"));
            }
            msg.push('.');
            XftError::InvalidDType(msg)
        })?;

        let canonical = self.canonicalize_dtype(original);
        let warning = (canonical != original).then(|| DowncastWarning {
            original,
            canonical,
            argument: name.map(str::to_string),
        });
        Ok((canonical, warning))
    }

    /// Validate and canonicalize a user-supplied dtype, emitting a warning
    /// event when it is narrowed.
    pub fn check_and_canonicalize_user_dtype<D>(
        &self,
        dtype: Option<D>,
        name: Option<&str>,
    ) -> Result<DType>
    where
        D: ToDType + fmt::Display,
    {
        let (canonical, warning) = self.check_user_dtype(dtype, name)?;
        if let Some(w) = warning {
            warn!(
                original = %w.original,
                canonical = %w.canonical,
                argument = w.argument.as_deref().unwrap_or_default(),
                "{w}"
            );
        }
        Ok(canonical)
    }

    pub fn default_int_dtype(&self) -> DType {
        self.config.default_int()
    }

    pub fn default_uint_dtype(&self) -> DType {
        self.config.default_uint()
    }

    pub fn default_float_dtype(&self) -> DType {
        self.config.default_float()
    }

    pub fn default_complex_dtype(&self) -> DType {
        self.config.default_complex()
    }
}

/// [`Promoter::canonicalize_dtype`] under the current configuration.
pub fn canonicalize_dtype(dtype: DType) -> DType {
    Promoter::current().canonicalize_dtype(dtype)
}

/// [`Promoter::check_and_canonicalize_user_dtype`] under the current
/// configuration.
pub fn check_and_canonicalize_user_dtype<D>(dtype: Option<D>, name: Option<&str>) -> Result<DType>
where
    D: ToDType + fmt::Display,
{
    Promoter::current().check_and_canonicalize_user_dtype(dtype, name)
}

pub fn default_int_dtype() -> DType {
    Promoter::current().default_int_dtype()
}

pub fn default_uint_dtype() -> DType {
    Promoter::current().default_uint_dtype()
}

pub fn default_float_dtype() -> DType {
    Promoter::current().default_float_dtype()
}

pub fn default_complex_dtype() -> DType {
    Promoter::current().default_complex_dtype()
}
