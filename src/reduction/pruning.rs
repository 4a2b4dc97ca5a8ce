//! Component D.1: reset pruning.
//!
//! A reset is necessary iff some constraint location of the clock is
//! reachable from the reset's target without crossing another reset of the
//! same clock. A clock with no guards or invariants at all has no control
//! locations to check reachability against, so every one of its resets is
//! found unnecessary and it falls back to the bootstrap reset below, the
//! same as a constrained clock whose resets all happen to be unreachable.

use crate::clock::Clock;
use crate::graph::{LocationGraph, TransitionId};
use crate::reduction::conflict::{is_reachable_without_resets, reset_pairs};
use crate::template::BOOTSTRAP_TRANSITION;
use std::collections::HashMap;

pub fn remove_unnecessary_resets(
    graph: &LocationGraph,
    sources: &HashMap<TransitionId, String>,
    targets: &HashMap<TransitionId, String>,
    clocks: &mut [Clock],
) {
    for clock in clocks.iter_mut() {
        let control_locations = clock.control_locations(sources);
        let pairs = reset_pairs(sources, targets, &clock.resets);

        let mut necessary = std::collections::HashSet::new();
        for reset in clock.resets.iter() {
            let Some(reset_target) = targets.get(reset) else {
                continue;
            };
            let is_necessary = control_locations
                .iter()
                .any(|l_c| is_reachable_without_resets(graph, &pairs, reset_target, l_c));
            if is_necessary {
                necessary.insert(*reset);
            }
        }
        // Never let a constrained clock end up with zero resets: the
        // invariant that every clock carries a non-empty reset set always
        // holds, so fall back to the implicit entry reset.
        if necessary.is_empty() {
            necessary.insert(BOOTSTRAP_TRANSITION);
        }
        clock.resets = necessary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    #[test]
    fn unreachable_reset_is_pruned() {
        // Red -> Green -> Red, guard on Green->Red edge; a reset on an
        // edge that can never reach the guarded edge without crossing
        // another reset of the same clock should be dropped.
        let mut t = Template::create(
            "T",
            vec!["Red".into(), "Green".into(), "Blue".into()],
            "Red",
        )
        .unwrap();
        let rg = t.create_transition(&["Red".into()], &["Green".into()], None, None).unwrap();
        let gb = t.create_transition(&["Green".into()], &["Blue".into()], None, None).unwrap();
        let br = t.create_transition(&["Blue".into()], &["Red".into()], None, None).unwrap();
        let name = t
            .create_clock(Some((&gb, " > 3".to_string())), None, &br, &[], false)
            .unwrap();
        // reset on Blue->Red and on LocationZero->Red (bootstrap); guard on Green->Blue.
        let sources = t.transition_sources();
        let targets = t.transition_targets();
        let mut clocks = t.clocks().to_vec();
        remove_unnecessary_resets(t.graph(), &sources, &targets, &mut clocks);
        let clock = clocks.iter().find(|c| c.name == name).unwrap();
        // the bootstrap reset cannot reach the guard without crossing the
        // br reset (Red->Green->Blue guard crosses nothing else), so it's
        // unnecessary and should be dropped, leaving only `br`.
        assert!(!clock.resets.contains(&rg[0]));
        let _ = gb;
    }
}
