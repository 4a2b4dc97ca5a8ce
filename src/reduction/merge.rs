//! Component D.4: conflict graph construction, greedy largest-first
//! colouring, and merge of each colour class into one clock.
//!
//! The colouring heuristic (largest-degree-first greedy) is fixed for
//! reproducibility, so it is implemented directly here rather than pulled
//! from a crate.

use crate::clock::Clock;
use crate::graph::{LocationGraph, TransitionId};
use crate::reduction::conflict::{is_dependent, reset_pairs, reset_target_locations};
use std::collections::{HashMap, HashSet};

/// Parses the `k` out of a `x_k` clock name for the deterministic total
/// order required before colouring. Falls back to 0 for non-conforming
/// names so the sort is still well-defined (never panics).
fn clock_index(name: &str) -> u64 {
    name.strip_prefix("x_").and_then(|k| k.parse().ok()).unwrap_or(0)
}

struct ClockMeta {
    resets: HashSet<(String, String)>,
    reset_targets: HashSet<String>,
    control: HashSet<String>,
}

pub struct MergeOutcome {
    pub clocks: Vec<Clock>,
    /// old shard name -> representative name it was merged into.
    pub representative: HashMap<String, String>,
}

pub fn merge(
    graph: &LocationGraph,
    sources: &HashMap<TransitionId, String>,
    targets: &HashMap<TransitionId, String>,
    mut clocks: Vec<Clock>,
) -> MergeOutcome {
    clocks.sort_by_key(|c| clock_index(&c.name));
    let names: Vec<String> = clocks.iter().map(|c| c.name.clone()).collect();

    let meta: HashMap<String, ClockMeta> = clocks
        .iter()
        .map(|c| {
            (
                c.name.clone(),
                ClockMeta {
                    resets: reset_pairs(sources, targets, &c.resets),
                    reset_targets: reset_target_locations(targets, &c.resets),
                    control: c.control_locations(sources).into_iter().collect(),
                },
            )
        })
        .collect();

    // Conflict graph.
    let mut adjacency: HashMap<String, HashSet<String>> =
        names.iter().map(|n| (n.clone(), HashSet::new())).collect();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let a = &meta[&names[i]];
            let b = &meta[&names[j]];
            if is_dependent(
                graph,
                &a.resets,
                &a.reset_targets,
                &a.control,
                &b.resets,
                &b.reset_targets,
                &b.control,
            ) {
                adjacency.get_mut(&names[i]).unwrap().insert(names[j].clone());
                adjacency.get_mut(&names[j]).unwrap().insert(names[i].clone());
            }
        }
    }

    // Largest-first greedy colouring: sort vertices by descending degree,
    // ties broken by ascending clock index for determinism.
    let mut order = names.clone();
    order.sort_by(|a, b| {
        let deg_a = adjacency[a].len();
        let deg_b = adjacency[b].len();
        deg_b.cmp(&deg_a).then_with(|| clock_index(a).cmp(&clock_index(b)))
    });

    let mut colours: HashMap<String, usize> = HashMap::new();
    for v in &order {
        let used: HashSet<usize> = adjacency[v]
            .iter()
            .filter_map(|n| colours.get(n).copied())
            .collect();
        let mut c = 0;
        while used.contains(&c) {
            c += 1;
        }
        colours.insert(v.clone(), c);
    }

    let max_colour = colours.values().copied().max().unwrap_or(0);
    let by_name: HashMap<String, Clock> = clocks.into_iter().map(|c| (c.name.clone(), c)).collect();

    let mut merged_clocks = Vec::new();
    let mut representative = HashMap::new();

    for colour in 0..=max_colour {
        // Partition members in the deterministic `order` produced by
        // colouring; representative is the first member in that order.
        let partition: Vec<&String> = order.iter().filter(|n| colours[*n] == colour).collect();
        if partition.is_empty() {
            continue;
        }
        let rep_name = partition[0].clone();
        let mut merged = Clock::new(rep_name.clone(), false);
        for member in &partition {
            let c = &by_name[*member];
            for (k, v) in &c.guards {
                merged.guards.entry(*k).or_default().extend(v.iter().cloned());
            }
            for (k, v) in &c.invariants {
                merged.invariants.entry(k.clone()).or_default().extend(v.iter().cloned());
            }
            for r in &c.resets {
                merged.resets.insert(*r);
            }
            representative.insert((*member).clone(), rep_name.clone());
        }
        merged_clocks.push(merged);
    }

    MergeOutcome {
        clocks: merged_clocks,
        representative,
    }
}
