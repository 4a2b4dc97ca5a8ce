//! Component D.2: splitting.
//!
//! A clock with exactly one reset and several distinct constraints is split
//! into one shard per constraint reachable (reset-free) from that reset,
//! unless any two resulting shards would be mutually dependent, in which
//! case the split is abandoned and the original clock is kept whole.

use crate::clock::Clock;
use crate::graph::{LocationGraph, TransitionId};
use crate::reduction::conflict::{is_dependent, reset_pairs, reset_target_locations};
use std::collections::{HashMap, HashSet};

pub struct SplitOutcome {
    pub clocks: Vec<Clock>,
    pub mapping_update: HashMap<String, Vec<String>>,
}

pub fn split(
    graph: &LocationGraph,
    sources: &HashMap<TransitionId, String>,
    targets: &HashMap<TransitionId, String>,
    clocks: Vec<Clock>,
    alloc_name: &mut impl FnMut() -> String,
) -> SplitOutcome {
    let mut result = Vec::new();
    let mut mapping_update = HashMap::new();

    for clock in clocks {
        if clock.resets.len() != 1 {
            mapping_update.insert(clock.name.clone(), vec![clock.name.clone()]);
            result.push(clock);
            continue;
        }
        let reset = *clock.resets.iter().next().unwrap();
        let Some(reset_target) = targets.get(&reset).cloned() else {
            mapping_update.insert(clock.name.clone(), vec![clock.name.clone()]);
            result.push(clock);
            continue;
        };
        let pairs = reset_pairs(sources, targets, &clock.resets);

        let mut guard_keys: Vec<TransitionId> = clock.guards.keys().copied().collect();
        guard_keys.sort_unstable();
        let mut invariant_keys: Vec<String> = clock.invariants.keys().cloned().collect();
        invariant_keys.sort();

        let mut shards: Vec<Clock> = Vec::new();
        for id in &guard_keys {
            let Some(src) = sources.get(id) else { continue };
            if is_reachable_without_resets_local(graph, &pairs, &reset_target, src) {
                let mut shard = Clock::new(alloc_name(), false);
                shard.guards.insert(*id, clock.guards[id].clone());
                shard.add_reset(reset);
                shards.push(shard);
            }
        }
        for loc in &invariant_keys {
            if is_reachable_without_resets_local(graph, &pairs, &reset_target, loc) {
                let mut shard = Clock::new(alloc_name(), false);
                shard.invariants.insert(loc.clone(), clock.invariants[loc].clone());
                shard.add_reset(reset);
                shards.push(shard);
            }
        }

        if shards.len() <= 1 {
            mapping_update.insert(clock.name.clone(), vec![clock.name.clone()]);
            result.push(clock);
            continue;
        }

        // Abort if any two shards are mutually dependent: splitting would
        // recreate exactly the conflict the subsequent merge has to undo.
        let mut aborted = false;
        'outer: for i in 0..shards.len() {
            for j in (i + 1)..shards.len() {
                let ri = reset_pairs(sources, targets, &shards[i].resets);
                let rj = reset_pairs(sources, targets, &shards[j].resets);
                let ti = reset_target_locations(targets, &shards[i].resets);
                let tj = reset_target_locations(targets, &shards[j].resets);
                let ci: HashSet<String> = shards[i].control_locations(sources).into_iter().collect();
                let cj: HashSet<String> = shards[j].control_locations(sources).into_iter().collect();
                if is_dependent(graph, &ri, &ti, &ci, &rj, &tj, &cj) {
                    aborted = true;
                    break 'outer;
                }
            }
        }

        if aborted {
            mapping_update.insert(clock.name.clone(), vec![clock.name.clone()]);
            result.push(clock);
        } else {
            mapping_update.insert(clock.name.clone(), shards.iter().map(|s| s.name.clone()).collect());
            result.extend(shards);
        }
    }

    SplitOutcome {
        clocks: result,
        mapping_update,
    }
}

fn is_reachable_without_resets_local(
    graph: &LocationGraph,
    pairs: &HashSet<(String, String)>,
    source: &str,
    target: &str,
) -> bool {
    crate::reduction::conflict::is_reachable_without_resets(graph, pairs, source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    #[test]
    fn single_reset_two_guards_splits_into_two_shards() {
        // Start -> Mid (the one reset), then Mid branches to BranchA and
        // BranchB, each with its own guard on the same clock. Neither
        // branch reaches the other without crossing back through the
        // reset, so both shards are independent.
        let mut t = Template::create(
            "T",
            vec!["Start".into(), "Mid".into(), "BranchA".into(), "BranchB".into()],
            "Start",
        )
        .unwrap();
        let reset = t.create_transition(&["Start".into()], &["Mid".into()], None, None).unwrap();
        let a = t.create_transition(&["Mid".into()], &["BranchA".into()], None, None).unwrap();
        let b = t.create_transition(&["Mid".into()], &["BranchB".into()], None, None).unwrap();
        let mut ids = a.clone();
        ids.extend(b.clone());
        let name =
            t.create_clock(Some((&ids, " > 3".to_string())), None, &reset, &[], false).unwrap();

        let sources = t.transition_sources();
        let targets = t.transition_targets();
        let clocks = t.clocks().to_vec();
        let mut next = 10u32;
        let mut alloc = move || {
            let n = format!("x_{next}");
            next += 1;
            n
        };
        let outcome = split(t.graph(), &sources, &targets, clocks, &mut alloc);

        assert_eq!(outcome.mapping_update[&name].len(), 2);
        assert_eq!(outcome.clocks.len(), 2);
        for shard in &outcome.clocks {
            assert_eq!(shard.guards.len(), 1);
            assert_eq!(shard.resets.len(), 1);
        }
    }

    #[test]
    fn multi_reset_clock_is_left_whole() {
        let mut t = Template::create("T", vec!["A".into(), "B".into()], "A").unwrap();
        let ab = t.create_transition(&["A".into()], &["B".into()], None, None).unwrap();
        let ba = t.create_transition(&["B".into()], &["A".into()], None, None).unwrap();
        let mut resets = ab.clone();
        resets.extend(ba.clone());
        let name =
            t.create_clock(Some((&ab, " > 1".to_string())), None, &resets, &[], false).unwrap();

        let sources = t.transition_sources();
        let targets = t.transition_targets();
        let clocks = t.clocks().to_vec();
        let mut alloc = || unreachable!("a multi-reset clock should never need a fresh name");
        let outcome = split(t.graph(), &sources, &targets, clocks, &mut alloc);

        assert_eq!(outcome.mapping_update[&name], vec![name.clone()]);
        assert_eq!(outcome.clocks.len(), 1);
    }
}
