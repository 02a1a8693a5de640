//! Least-upper-bound solver over a [`Lattice`].

use smallvec::SmallVec;
use xft_core::{Result, XftError};

use crate::lattice::{Lattice, Node, NodeSet};

/// The unique least upper bound of `nodes`.
///
/// If one of the inputs is itself a common upper bound it wins. Otherwise
/// the candidates are the common upper bounds whose own upper-bound set
/// covers every other common upper bound.
pub fn least_upper_bound(lattice: &Lattice, nodes: &[Node]) -> Result<Node> {
    if nodes.is_empty() {
        return Err(XftError::InvalidValue(
            "least upper bound requires at least one node".into(),
        ));
    }

    let mut inputs = NodeSet::EMPTY;
    let mut common = NodeSet::FULL;
    let mut invalid: SmallVec<[Node; 2]> = SmallVec::new();
    for &node in nodes {
        match lattice.upper_bounds(node) {
            Some(ub) => {
                inputs.insert(node);
                common = common.intersection(ub);
            }
            None => invalid.push(node),
        }
    }
    if !invalid.is_empty() {
        return Err(XftError::InvalidDType(format!(
            "Invalid dtypes for promotion: [{}]",
            join(&invalid)
        )));
    }

    let mut least = common.intersection(inputs);
    if least.is_empty() {
        least = common
            .iter()
            .filter(|&c| {
                lattice
                    .upper_bounds(c)
                    .is_some_and(|ub| common.is_subset(ub))
            })
            .collect();
    }

    match (least.len(), least.first()) {
        (1, Some(node)) => Ok(node),
        (0, _) => Err(XftError::NoPromotionPath {
            mode: lattice.mode(),
            nodes: names(nodes.iter().copied()),
        }),
        _ => Err(XftError::AmbiguousPromotion {
            nodes: names(nodes.iter().copied()),
            candidates: names(least.iter()),
        }),
    }
}

fn names(nodes: impl Iterator<Item = Node>) -> Vec<String> {
    nodes.map(|n| n.to_string()).collect()
}

fn join(nodes: &[Node]) -> String {
    names(nodes.iter().copied()).join(", ")
}
