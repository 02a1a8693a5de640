//! The promotion lattice.
//!
//! Nodes are the catalog dtypes (string excluded) plus the three weak
//! literal kinds. Each node lists its immediate parents; the upper-bound
//! set of a node is the reflexive transitive closure of those edges. Both
//! lattices are built once per process and shared read-only.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use smallvec::{SmallVec, smallvec};
use tracing::debug;
use xft_core::{DType, PromotionMode, Result, ScalarKind, WeakKind, XftError};

/// Number of distinct lattice nodes.
pub const NODE_COUNT: usize = DType::ALL.len() + WeakKind::ALL.len();

/// A vertex of the promotion lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    DType(DType),
    Weak(WeakKind),
}

impl Node {
    /// Dense index into per-node tables, or `None` for dtypes that are
    /// not lattice members.
    pub fn index(self) -> Option<usize> {
        match self {
            Node::DType(DType::String) => None,
            Node::DType(dt) => Some(dt as usize),
            Node::Weak(kind) => Some(DType::ALL.len() + kind as usize),
        }
    }

    pub fn from_index(index: usize) -> Option<Node> {
        match DType::ALL.get(index) {
            Some(&dt) => Some(Node::DType(dt)),
            None => WeakKind::ALL
                .get(index - DType::ALL.len())
                .map(|&kind| Node::Weak(kind)),
        }
    }

    pub fn is_weak(self) -> bool {
        matches!(self, Node::Weak(_))
    }

    /// Every lattice node, concrete dtypes first.
    pub fn all() -> impl Iterator<Item = Node> {
        (0..NODE_COUNT).filter_map(Node::from_index)
    }
}

impl From<DType> for Node {
    fn from(dt: DType) -> Self {
        Node::DType(dt)
    }
}

impl From<WeakKind> for Node {
    fn from(kind: WeakKind) -> Self {
        Node::Weak(kind)
    }
}

/// Literal kinds enter the lattice as their weak node; bool has no weak
/// form and is its own dtype.
impl From<ScalarKind> for Node {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Node::DType(DType::Bool),
            ScalarKind::Int => Node::Weak(WeakKind::Int),
            ScalarKind::Float => Node::Weak(WeakKind::Float),
            ScalarKind::Complex => Node::Weak(WeakKind::Complex),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::DType(dt) => fmt::Display::fmt(dt, f),
            Node::Weak(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

/// `int`, `float` and `complex` name the weak nodes; anything else must be
/// a dtype name.
impl FromStr for Node {
    type Err = XftError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(Node::Weak(WeakKind::Int)),
            "float" => Ok(Node::Weak(WeakKind::Float)),
            "complex" => Ok(Node::Weak(WeakKind::Complex)),
            _ => s.parse().map(Node::DType),
        }
    }
}

/// Map a (dtype, weak) pair to the node it occupies.
///
/// Weak ints, floats and complexes collapse onto their kind's weak node.
/// A weak bool stays `bool`, and weak non-numeric dtypes keep their dtype.
pub fn lattice_node(dtype: DType, weak: bool) -> Node {
    if !weak {
        return Node::DType(dtype);
    }
    if dtype.is_int() {
        Node::Weak(WeakKind::Int)
    } else if dtype.is_float() {
        Node::Weak(WeakKind::Float)
    } else if dtype.is_complex() {
        Node::Weak(WeakKind::Complex)
    } else {
        Node::DType(dtype)
    }
}

// ── Node sets ───────────────────────────────────────────────────────────

/// Set of lattice nodes packed into one word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeSet(u64);

impl NodeSet {
    pub const EMPTY: NodeSet = NodeSet(0);
    pub const FULL: NodeSet = NodeSet((1u64 << NODE_COUNT) - 1);

    fn bit(index: usize) -> NodeSet {
        NodeSet(1u64 << index)
    }

    pub fn insert(&mut self, node: Node) {
        if let Some(i) = node.index() {
            self.0 |= 1u64 << i;
        }
    }

    pub fn contains(self, node: Node) -> bool {
        node.index().is_some_and(|i| self.0 & (1u64 << i) != 0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_subset(self, other: NodeSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn union(self, other: NodeSet) -> NodeSet {
        NodeSet(self.0 | other.0)
    }

    pub fn intersection(self, other: NodeSet) -> NodeSet {
        NodeSet(self.0 & other.0)
    }

    fn indices(self) -> impl Iterator<Item = usize> {
        (0..NODE_COUNT).filter(move |&i| self.0 & (1u64 << i) != 0)
    }

    /// Members in index order.
    pub fn iter(self) -> impl Iterator<Item = Node> {
        self.indices().filter_map(Node::from_index)
    }

    pub fn first(self) -> Option<Node> {
        if self.is_empty() {
            return None;
        }
        Node::from_index(self.0.trailing_zeros() as usize)
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut set = NodeSet::EMPTY;
        for node in iter {
            set.insert(node);
        }
        set
    }
}

// ── Lattice ─────────────────────────────────────────────────────────────

pub type Parents = SmallVec<[Node; 4]>;

/// Immediate parents plus the precomputed upper-bound set of every node.
#[derive(Clone, Debug)]
pub struct Lattice {
    mode: PromotionMode,
    parents: Vec<Parents>,
    upper_bounds: Vec<NodeSet>,
}

impl Lattice {
    /// Build the lattice for `mode` from its fixed edge table.
    pub fn build(mode: PromotionMode) -> Result<Self> {
        Self::from_edges(mode, edge_table(mode))
    }

    /// Build a lattice from an explicit adjacency list. Nodes without an
    /// entry have no parents.
    ///
    /// Fails with [`XftError::LatticeCycle`] if any node is its own proper
    /// upper bound.
    pub fn from_edges<I>(mode: PromotionMode, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Node, Parents)>,
    {
        let mut parents = vec![Parents::new(); NODE_COUNT];
        for (node, targets) in edges {
            let i = member_index(node)?;
            for &target in &targets {
                member_index(target)?;
            }
            parents[i] = targets;
        }
        let upper_bounds = close(mode, &parents)?;
        let edge_count: usize = parents.iter().map(SmallVec::len).sum();
        debug!(%mode, nodes = NODE_COUNT, edges = edge_count, "built promotion lattice");
        Ok(Self {
            mode,
            parents,
            upper_bounds,
        })
    }

    pub fn mode(&self) -> PromotionMode {
        self.mode
    }

    /// Immediate parents of `node`; empty for non-members.
    pub fn parents(&self, node: Node) -> &[Node] {
        match node.index() {
            Some(i) => &self.parents[i],
            None => &[],
        }
    }

    /// Every node reachable from `node`, `node` included. `None` for
    /// non-members.
    pub fn upper_bounds(&self, node: Node) -> Option<NodeSet> {
        node.index().map(|i| self.upper_bounds[i])
    }

    pub fn contains(&self, node: Node) -> bool {
        node.index().is_some()
    }

    /// All `(node, parent)` edges.
    pub fn edges(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        Node::all().flat_map(move |node| self.parents(node).iter().map(move |&p| (node, p)))
    }
}

fn member_index(node: Node) -> Result<usize> {
    node.index()
        .ok_or_else(|| XftError::InvalidDType(format!("{node} is not a promotion lattice node")))
}

/// Fixed-point transitive closure over the parent lists.
fn close(mode: PromotionMode, parents: &[Parents]) -> Result<Vec<NodeSet>> {
    let mut upper_bounds = Vec::with_capacity(NODE_COUNT);
    for i in 0..NODE_COUNT {
        let mut reached = NodeSet::bit(i);
        loop {
            let mut next = NodeSet::EMPTY;
            for j in reached.indices() {
                next = next.union(parents[j].iter().copied().collect());
            }
            if next.0 & NodeSet::bit(i).0 != 0 {
                let node = Node::from_index(i).map_or_else(|| i.to_string(), |n| n.to_string());
                return Err(XftError::LatticeCycle { mode, node });
            }
            if next.is_subset(reached) {
                break;
            }
            reached = reached.union(next);
        }
        upper_bounds.push(reached);
    }
    Ok(upper_bounds)
}

/// Adjacency list for `mode`.
pub fn edge_table(mode: PromotionMode) -> Vec<(Node, Parents)> {
    match mode {
        PromotionMode::Standard => standard_edges(),
        PromotionMode::Strict => strict_edges(),
    }
}

fn standard_edges() -> Vec<(Node, Parents)> {
    use DType::*;
    let d = Node::DType;
    let wi = Node::Weak(WeakKind::Int);
    let wf = Node::Weak(WeakKind::Float);
    let wc = Node::Weak(WeakKind::Complex);

    let mut table: Vec<(Node, Parents)> = vec![
        (d(Bool), smallvec![wi]),
        (
            wi,
            smallvec![d(Uint2), d(Uint4), d(Uint8), d(Int2), d(Int4), d(Int8)],
        ),
        (d(Uint2), smallvec![]),
        (d(Uint4), smallvec![]),
        (d(Int2), smallvec![]),
        (d(Int4), smallvec![]),
        (d(Uint8), smallvec![d(Int16), d(Uint16)]),
        (d(Int8), smallvec![d(Int16)]),
        (d(Uint16), smallvec![d(Int32), d(Uint32)]),
        (d(Int16), smallvec![d(Int32)]),
        (d(Uint32), smallvec![d(Int64), d(Uint64)]),
        (d(Int32), smallvec![d(Int64)]),
        (d(Uint64), smallvec![wf]),
        (d(Int64), smallvec![wf]),
        (
            wf,
            DType::CUSTOM_FPS
                .iter()
                .copied()
                .map(d)
                .chain([d(Float16), wc])
                .collect(),
        ),
    ];
    for &fp in DType::CUSTOM_FPS {
        let up: Parents = if fp == Bfloat16 {
            smallvec![d(Float32)]
        } else {
            smallvec![]
        };
        table.push((d(fp), up));
    }
    let tail: [(Node, Parents); 6] = [
        (d(Float16), smallvec![d(Float32)]),
        (d(Float32), smallvec![d(Float64), d(Complex64)]),
        (d(Float64), smallvec![d(Complex128)]),
        (wc, smallvec![d(Complex64)]),
        (d(Complex64), smallvec![d(Complex128)]),
        (d(Complex128), smallvec![]),
    ];
    table.extend(tail);
    table
}

fn strict_edges() -> Vec<(Node, Parents)> {
    let d = Node::DType;
    let wi = Node::Weak(WeakKind::Int);
    let wf = Node::Weak(WeakKind::Float);
    let wc = Node::Weak(WeakKind::Complex);

    let mut table: Vec<(Node, Parents)> = vec![
        (d(DType::Bool), smallvec![wi]),
        (
            wi,
            std::iter::once(wf)
                .chain(DType::INTS.iter().copied().map(d))
                .collect(),
        ),
        (
            wf,
            std::iter::once(wc)
                .chain(DType::FLOATS.iter().copied().map(d))
                .collect(),
        ),
        (wc, DType::COMPLEXES.iter().copied().map(d).collect()),
    ];
    let concrete = DType::INTS
        .iter()
        .chain(DType::FLOATS)
        .chain(DType::COMPLEXES);
    table.extend(concrete.map(|&dt| (d(dt), Parents::new())));
    table
}

static STANDARD: LazyLock<Result<Lattice>> =
    LazyLock::new(|| Lattice::build(PromotionMode::Standard));
static STRICT: LazyLock<Result<Lattice>> = LazyLock::new(|| Lattice::build(PromotionMode::Strict));

/// The shared lattice for `mode`, built on first use.
pub fn lattice(mode: PromotionMode) -> Result<&'static Lattice> {
    let cell = match mode {
        PromotionMode::Standard => &STANDARD,
        PromotionMode::Strict => &STRICT,
    };
    LazyLock::force(cell).as_ref().map_err(Clone::clone)
}
