//! Promotion lattice, least-upper-bound solver and the public dtype API.
//!
//! Two lattices exist, one per [`xft_core::PromotionMode`]. Binary and
//! n-ary promotion resolve the least upper bound of their inputs on the
//! lattice for the active mode, with weak literals entering as the weak
//! int/float/complex nodes.

pub mod canonicalize;
pub mod dtype_promotion;
pub mod inference;
pub mod kinds;
pub mod lattice;
pub mod lub;

pub use canonicalize::{
    DowncastWarning, canonicalize_dtype, canonicalize_dtype_for, check_and_canonicalize_user_dtype,
    default_complex_dtype, default_float_dtype, default_int_dtype, default_uint_dtype,
};
pub use dtype_promotion::{
    Promoter, can_cast_safely, compatible_dtypes, promote_types, result_type, result_type_weak,
};
pub use inference::dtype;
pub use kinds::{
    AbstractKind, DTypeInfo, DTypeKind, KindSpec, SubdtypeTarget, dtype_to_native,
    get_dtype_info, is_string_dtype, isdtype, issubdtype, native_to_dtype, scalar_type,
    to_complex, to_inexact, to_numeric,
};
pub use lattice::{Lattice, Node, NodeSet, lattice, lattice_node};
pub use lub::least_upper_bound;
