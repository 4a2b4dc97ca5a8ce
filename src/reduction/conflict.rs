//! Component D.3: the dependency (conflict) predicate between two clocks.

use crate::graph::{LocationGraph, TransitionId};
use std::collections::{HashMap, HashSet};

/// The `(source, target)` location pairs a clock resets on. Reachability
/// "without resets" is checked against location pairs rather than transition
/// ids, because a simple path is a vertex sequence: if *any* parallel edge
/// between two consecutive locations is one of the clock's resets, that hop
/// counts as passing through a reset.
pub fn reset_pairs(
    sources: &HashMap<TransitionId, String>,
    targets: &HashMap<TransitionId, String>,
    resets: &HashSet<TransitionId>,
) -> HashSet<(String, String)> {
    resets
        .iter()
        .filter_map(|id| Some((sources.get(id)?.clone(), targets.get(id)?.clone())))
        .collect()
}

pub fn reset_target_locations(
    targets: &HashMap<TransitionId, String>,
    resets: &HashSet<TransitionId>,
) -> HashSet<String> {
    resets.iter().filter_map(|id| targets.get(id).cloned()).collect()
}

fn path_is_reset_free(path: &[String], reset_pairs: &HashSet<(String, String)>) -> bool {
    path.windows(2)
        .all(|pair| !reset_pairs.contains(&(pair[0].clone(), pair[1].clone())))
}

/// True iff some simple path from `source` to `target` crosses no reset of
/// the clock described by `reset_pairs` (or `source == target`).
pub fn is_reachable_without_resets(
    graph: &LocationGraph,
    reset_pairs: &HashSet<(String, String)>,
    source: &str,
    target: &str,
) -> bool {
    if source == target {
        return true;
    }
    graph
        .all_simple_paths(source, target)
        .iter()
        .any(|path| path_is_reset_free(path, reset_pairs))
}

/// `scope(c)`: the union, over every `(reset, constraint)` pair of `c`, of
/// the simple paths from the reset's target to the constraint's location
/// that cross no reset of `c`.
pub fn scope(
    graph: &LocationGraph,
    reset_pairs: &HashSet<(String, String)>,
    reset_targets: &HashSet<String>,
    control_locations: &HashSet<String>,
) -> Vec<Vec<String>> {
    let mut result = Vec::new();
    for t_r in reset_targets {
        for l_c in control_locations {
            for path in graph.all_simple_paths(t_r, l_c).iter() {
                if path_is_reset_free(path, reset_pairs) {
                    result.push(path.clone());
                }
            }
        }
    }
    result
}

/// Two clocks are dependent iff the scope of one contains a reset-target
/// location of the other (checked both ways; the relation is symmetric by
/// construction since both directions are tested explicitly).
#[allow(clippy::too_many_arguments)]
pub fn is_dependent(
    graph: &LocationGraph,
    resets1: &HashSet<(String, String)>,
    reset_targets1: &HashSet<String>,
    control1: &HashSet<String>,
    resets2: &HashSet<(String, String)>,
    reset_targets2: &HashSet<String>,
    control2: &HashSet<String>,
) -> bool {
    let scope1 = scope(graph, resets1, reset_targets1, control1);
    for path in &scope1 {
        if path.len() > 1 && path[1..].iter().any(|l| reset_targets2.contains(l)) {
            return true;
        }
    }
    let scope2 = scope(graph, resets2, reset_targets2, control2);
    for path in &scope2 {
        if path.len() > 1 && path[1..].iter().any(|l| reset_targets1.contains(l)) {
            return true;
        }
    }
    false
}
