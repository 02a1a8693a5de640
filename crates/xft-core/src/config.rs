//! Promotion mode and precision policy.
//!
//! `PromotionConfig` is a plain value that can be threaded through calls
//! explicitly (see `xft_ops::Promoter`). The process-wide current config is
//! what the free functions read; `scoped_config` installs a config for a
//! region and restores the previous one on drop.

use std::fmt;
use std::str::FromStr;

use parking_lot::{RwLock, const_rwlock};
use tracing::info;

use crate::types::DType;
use crate::{Result, XftError};

/// Which lattice edges exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PromotionMode {
    /// NumPy-compatible: implicit int→float widening.
    #[default]
    Standard,
    /// No implicit promotion between distinct concrete types.
    Strict,
}

impl PromotionMode {
    pub const ALL: [PromotionMode; 2] = [PromotionMode::Standard, PromotionMode::Strict];

    pub fn as_str(self) -> &'static str {
        match self {
            PromotionMode::Standard => "standard",
            PromotionMode::Strict => "strict",
        }
    }
}

impl fmt::Display for PromotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromotionMode {
    type Err = XftError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(PromotionMode::Standard),
            "strict" => Ok(PromotionMode::Strict),
            _ => Err(XftError::InvalidValue(format!(
                "Invalid promotion mode '{s}'. Expected 'standard' or 'strict'."
            ))),
        }
    }
}

/// Mode plus the x64 precision flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PromotionConfig {
    pub mode: PromotionMode,
    /// When false, 64-bit defaults become their 32-bit counterparts.
    pub x64: bool,
}

impl PromotionConfig {
    pub const DEFAULT: PromotionConfig = PromotionConfig {
        mode: PromotionMode::Standard,
        x64: true,
    };

    pub fn new(mode: PromotionMode, x64: bool) -> Self {
        Self { mode, x64 }
    }

    pub fn with_mode(self, mode: PromotionMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_x64(self, x64: bool) -> Self {
        Self { x64, ..self }
    }

    pub fn default_int(&self) -> DType {
        if self.x64 { DType::Int64 } else { DType::Int32 }
    }

    pub fn default_uint(&self) -> DType {
        if self.x64 { DType::Uint64 } else { DType::Uint32 }
    }

    pub fn default_float(&self) -> DType {
        if self.x64 {
            DType::Float64
        } else {
            DType::Float32
        }
    }

    pub fn default_complex(&self) -> DType {
        if self.x64 {
            DType::Complex128
        } else {
            DType::Complex64
        }
    }
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static CURRENT: RwLock<PromotionConfig> = const_rwlock(PromotionConfig::DEFAULT);

/// Snapshot of the process-wide configuration.
pub fn current_config() -> PromotionConfig {
    *CURRENT.read()
}

/// Replace the process-wide configuration, returning the previous one.
pub fn set_config(config: PromotionConfig) -> PromotionConfig {
    let mut current = CURRENT.write();
    let previous = *current;
    *current = config;
    if previous != config {
        info!(
            mode = %config.mode,
            x64 = config.x64,
            previous_mode = %previous.mode,
            previous_x64 = previous.x64,
            "promotion config changed"
        );
    }
    previous
}

/// Set the promotion mode by name (`"standard"` or `"strict"`).
pub fn set_promotion_mode(mode: &str) -> Result<()> {
    let mode: PromotionMode = mode.parse()?;
    let mut current = CURRENT.write();
    if current.mode != mode {
        info!(from = %current.mode, to = %mode, "promotion mode changed");
    }
    current.mode = mode;
    Ok(())
}

pub fn get_promotion_mode() -> PromotionMode {
    CURRENT.read().mode
}

pub fn set_x64_enabled(enabled: bool) {
    let mut current = CURRENT.write();
    if current.x64 != enabled {
        info!(x64 = enabled, "x64 mode changed");
    }
    current.x64 = enabled;
}

pub fn get_x64_enabled() -> bool {
    CURRENT.read().x64
}

/// Restores the configuration that was current before `scoped_config`.
#[must_use = "the previous config is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ConfigGuard {
    previous: PromotionConfig,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        set_config(self.previous);
    }
}

/// Install `config` process-wide until the returned guard drops.
pub fn scoped_config(config: PromotionConfig) -> ConfigGuard {
    ConfigGuard {
        previous: set_config(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Tests here mutate the process-wide config.
    static LOCK: Mutex<()> = parking_lot::const_mutex(());

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "standard".parse::<PromotionMode>().unwrap(),
            PromotionMode::Standard
        );
        assert_eq!(
            "strict".parse::<PromotionMode>().unwrap(),
            PromotionMode::Strict
        );
        let err = "lenient".parse::<PromotionMode>().unwrap_err();
        assert!(matches!(err, XftError::InvalidValue(_)));
        assert!(err.to_string().contains("'lenient'"));
    }

    #[test]
    fn test_defaults_follow_x64() {
        let wide = PromotionConfig::DEFAULT;
        assert_eq!(wide.default_int(), DType::Int64);
        assert_eq!(wide.default_uint(), DType::Uint64);
        assert_eq!(wide.default_float(), DType::Float64);
        assert_eq!(wide.default_complex(), DType::Complex128);

        let narrow = wide.with_x64(false);
        assert_eq!(narrow.default_int(), DType::Int32);
        assert_eq!(narrow.default_uint(), DType::Uint32);
        assert_eq!(narrow.default_float(), DType::Float32);
        assert_eq!(narrow.default_complex(), DType::Complex64);
    }

    #[test]
    fn test_global_setters() {
        let _lock = LOCK.lock();
        let _guard = scoped_config(PromotionConfig::DEFAULT);

        set_promotion_mode("strict").unwrap();
        assert_eq!(get_promotion_mode(), PromotionMode::Strict);
        assert!(set_promotion_mode("loose").is_err());
        assert_eq!(get_promotion_mode(), PromotionMode::Strict);

        set_x64_enabled(false);
        assert!(!get_x64_enabled());
        assert_eq!(
            current_config(),
            PromotionConfig::new(PromotionMode::Strict, false)
        );
    }

    #[test]
    fn test_scoped_config_restores_on_drop() {
        let _lock = LOCK.lock();
        let before = current_config();
        {
            let _guard = scoped_config(PromotionConfig::new(PromotionMode::Strict, false));
            assert_eq!(get_promotion_mode(), PromotionMode::Strict);
            assert!(!get_x64_enabled());
            {
                let _inner = scoped_config(current_config().with_x64(true));
                assert!(get_x64_enabled());
            }
            assert!(!get_x64_enabled());
        }
        assert_eq!(current_config(), before);
    }
}
