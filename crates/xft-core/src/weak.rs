//! Weak (untyped literal) values and the weak-type registry.
//!
//! An operand is weak when it is a builtin int/float/complex literal or an
//! object whose concrete Rust type has been registered with
//! [`register_weak_type`]. Weak operands are absorbed by stronger peers
//! during n-ary promotion. The check looks at the operand's runtime type,
//! never at its dtype.

use std::any::{Any, TypeId};
use std::fmt;

use parking_lot::{RwLock, const_rwlock};
use tracing::debug;

use crate::types::DType;

/// Lattice category standing in for a literal with no explicit dtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeakKind {
    Int,
    Float,
    Complex,
}

impl WeakKind {
    pub const ALL: [WeakKind; 3] = [WeakKind::Int, WeakKind::Float, WeakKind::Complex];

    pub fn name(self) -> &'static str {
        match self {
            WeakKind::Int => "int",
            WeakKind::Float => "float",
            WeakKind::Complex => "complex",
        }
    }
}

impl fmt::Display for WeakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The builtin literal kinds, used where a kind itself (rather than a
/// value of that kind) is passed around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Complex,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Complex => "complex",
        })
    }
}

/// A literal scalar value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    /// Wider than any catalog integer so that overflow can be detected.
    Int(i128),
    Float(f64),
    Complex { re: f64, im: f64 },
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Complex { .. } => ScalarKind::Complex,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Complex { re, im } => write!(f, "({re}{im:+}j)"),
        }
    }
}

/// A value that carries its own dtype metadata, such as an array.
pub trait HasDType: Any {
    fn dtype(&self) -> DType;
}

/// Input to dtype inference and n-ary promotion.
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    /// An explicit dtype handle.
    DType(DType),
    /// A literal kind itself; resolves to that kind's current default dtype.
    Kind(ScalarKind),
    Scalar(Scalar),
    Object(&'a dyn HasDType),
    /// Elements promoted together.
    Sequence(&'a [Operand<'a>]),
    /// An absent value.
    Missing,
}

impl<'a> Operand<'a> {
    pub fn object<T: HasDType>(value: &'a T) -> Self {
        Operand::Object(value)
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Operand::Scalar(Scalar::Complex { re, im })
    }
}

impl fmt::Debug for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::DType(dt) => write!(f, "DType({dt})"),
            Operand::Kind(kind) => write!(f, "Kind({kind})"),
            Operand::Scalar(s) => write!(f, "Scalar({s})"),
            Operand::Object(obj) => write!(f, "Object(dtype={})", obj.dtype()),
            Operand::Sequence(items) => f.debug_list().entries(items.iter()).finish(),
            Operand::Missing => write!(f, "Missing"),
        }
    }
}

impl From<DType> for Operand<'_> {
    fn from(dt: DType) -> Self {
        Operand::DType(dt)
    }
}

impl From<ScalarKind> for Operand<'_> {
    fn from(kind: ScalarKind) -> Self {
        Operand::Kind(kind)
    }
}

impl From<Scalar> for Operand<'_> {
    fn from(s: Scalar) -> Self {
        Operand::Scalar(s)
    }
}

impl From<bool> for Operand<'_> {
    fn from(b: bool) -> Self {
        Operand::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Operand<'_> {
    fn from(i: i64) -> Self {
        Operand::Scalar(Scalar::Int(i as i128))
    }
}

impl From<i128> for Operand<'_> {
    fn from(i: i128) -> Self {
        Operand::Scalar(Scalar::Int(i))
    }
}

impl From<f64> for Operand<'_> {
    fn from(x: f64) -> Self {
        Operand::Scalar(Scalar::Float(x))
    }
}

impl<'a> From<&'a [Operand<'a>]> for Operand<'a> {
    fn from(items: &'a [Operand<'a>]) -> Self {
        Operand::Sequence(items)
    }
}

impl<'a, T> From<Option<T>> for Operand<'a>
where
    T: Into<Operand<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Operand::Missing, Into::into)
    }
}

// ── Registry ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
struct WeakTypeEntry {
    id: TypeId,
    name: &'static str,
}

// Append-only for the life of the process.
static REGISTERED: RwLock<Vec<WeakTypeEntry>> = const_rwlock(Vec::new());

/// Treat every value of type `T` as weakly typed. Registering twice is a
/// no-op.
pub fn register_weak_type<T: HasDType>() {
    let id = TypeId::of::<T>();
    let mut registered = REGISTERED.write();
    if registered.iter().any(|e| e.id == id) {
        return;
    }
    let name = std::any::type_name::<T>();
    debug!(type_name = name, "registered weak type");
    registered.push(WeakTypeEntry { id, name });
}

/// Type names of every registered weak type, in registration order.
pub fn registered_weak_types() -> Vec<&'static str> {
    REGISTERED.read().iter().map(|e| e.name).collect()
}

fn is_registered(id: TypeId) -> bool {
    REGISTERED.read().iter().any(|e| e.id == id)
}

/// Whether `value` participates in promotion as a deferred literal.
///
/// Bool literals are not weak: they always promote as `bool`.
pub fn is_weakly_typed(value: &Operand<'_>) -> bool {
    match value {
        Operand::Scalar(Scalar::Int(_) | Scalar::Float(_) | Scalar::Complex { .. }) => true,
        Operand::Object(obj) => {
            let any: &dyn Any = *obj;
            is_registered(Any::type_id(any))
        }
        _ => false,
    }
}

/// Whether `value` is a builtin literal scalar.
pub fn is_scalar_type(value: &Operand<'_>) -> bool {
    matches!(value, Operand::Scalar(_))
}
