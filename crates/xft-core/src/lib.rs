//! Foundational dtype types for the xft promotion engine.
//!
//! `xft-core` provides the fixed dtype catalog (`DType`), its native binary
//! representation (`NativeType`), the process-wide precision and promotion
//! configuration, and the weak-type registry that decides whether an operand
//! participates in promotion as a concrete dtype or as an untyped literal.
//!
//! The lattice and the public promotion API live in `xft-ops`.

pub mod config;
pub mod native;
pub mod types;
pub mod weak;

pub use config::{
    ConfigGuard, PromotionConfig, PromotionMode, current_config, get_promotion_mode,
    get_x64_enabled, scoped_config, set_config, set_promotion_mode, set_x64_enabled,
};
pub use native::{FloatEncoding, FloatFormat, NativeType};
pub use types::{Category, DType, Limit, ToDType};
pub use weak::{
    HasDType, Operand, Scalar, ScalarKind, WeakKind, is_scalar_type, is_weakly_typed,
    register_weak_type, registered_weak_types,
};

pub type Result<T> = std::result::Result<T, XftError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum XftError {
    /// Input cannot be resolved to a known dtype, or the dtype is outside
    /// the domain of the requested operation.
    #[error("{0}")]
    InvalidDType(String),

    #[error("{}", no_path_message(.mode, .nodes))]
    NoPromotionPath {
        mode: PromotionMode,
        nodes: Vec<String>,
    },

    #[error(
        "Ambiguous promotion for ({}): multiple least upper bounds {{{}}}",
        .nodes.join(", "),
        .candidates.join(", ")
    )]
    AmbiguousPromotion {
        nodes: Vec<String>,
        candidates: Vec<String>,
    },

    #[error("integer literal {value} overflows default int type {dtype}")]
    Overflow { value: i128, dtype: DType },

    /// Missing or malformed argument (absent dtype, unknown mode or kind).
    #[error("{0}")]
    InvalidValue(String),

    #[error("Cycle detected in {mode} promotion lattice at node {node}")]
    LatticeCycle { mode: PromotionMode, node: String },
}

impl XftError {
    /// Whether this is one of the two promotion failures.
    pub fn is_promotion_error(&self) -> bool {
        matches!(
            self,
            XftError::NoPromotionPath { .. } | XftError::AmbiguousPromotion { .. }
        )
    }
}

fn no_path_message(mode: &PromotionMode, nodes: &[String]) -> String {
    let names = nodes.join(", ");
    match mode {
        PromotionMode::Strict => format!(
            "No implicit promotion for ({names}) in strict mode. \
             Use explicit casting or switch to 'standard' mode."
        ),
        PromotionMode::Standard => {
            format!("No implicit promotion path for ({names}). Use explicit casting.")
        }
    }
}
