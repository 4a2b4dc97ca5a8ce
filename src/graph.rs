//! Component A: multi-digraph over named locations.
//!
//! Locations are vertices; transitions are parallel, keyed edges (several
//! transitions may connect the same ordered pair of locations, carrying
//! different guards/synchronisations). `all_simple_paths` is the single
//! primitive the clock-reduction engine (component D) builds all of its
//! reachability reasoning on top of.

use lru::LruCache;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

pub type TransitionId = u32;

/// A directed, parallel-edge graph over location names.
///
/// Mutation (`add_node`/`add_edge`) bumps an internal generation counter;
/// `all_simple_paths` memoizes per `(src, dst)` keyed on that generation, so
/// the cache is implicitly invalidated on the next mutation and stable once
/// a template is finalized and no longer mutated.
pub struct LocationGraph {
    nodes: HashSet<String>,
    // src -> Vec<(dst, transition_id)>
    adjacency: HashMap<String, Vec<(String, TransitionId)>>,
    generation: u64,
    path_cache: RefCell<LruCache<(String, String, u64), std::rc::Rc<Vec<Vec<String>>>>>,
}

impl LocationGraph {
    pub fn new() -> Self {
        LocationGraph {
            nodes: HashSet::new(),
            adjacency: HashMap::new(),
            generation: 0,
            path_cache: RefCell::new(LruCache::new(NonZeroUsize::new(256).unwrap())),
        }
    }

    pub fn add_node(&mut self, name: &str) {
        if self.nodes.insert(name.to_string()) {
            self.generation += 1;
        }
    }

    pub fn add_edge(&mut self, src: &str, dst: &str, key: TransitionId) {
        self.add_node(src);
        self.add_node(dst);
        self.adjacency
            .entry(src.to_string())
            .or_default()
            .push((dst.to_string(), key));
        self.generation += 1;
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    /// Returns the `(src, dst)` endpoints of the given transition ids, in
    /// whichever order they were inserted.
    pub fn edges(&self, keys: &[TransitionId]) -> Vec<(String, String, TransitionId)> {
        let wanted: HashSet<TransitionId> = keys.iter().copied().collect();
        let mut result = Vec::new();
        for (src, outs) in &self.adjacency {
            for (dst, id) in outs {
                if wanted.contains(id) {
                    result.push((src.clone(), dst.clone(), *id));
                }
            }
        }
        result
    }

    /// All simple (no repeated vertex) paths from `src` to `dst`, as vertex
    /// sequences. When `src == dst`, the single-vertex path `[src]` is
    /// always included, so a location that both resets and constrains a
    /// clock trivially satisfies reachability-without-resets.
    pub fn all_simple_paths(&self, src: &str, dst: &str) -> std::rc::Rc<Vec<Vec<String>>> {
        let key = (src.to_string(), dst.to_string(), self.generation);
        if let Some(hit) = self.path_cache.borrow_mut().get(&key) {
            return hit.clone();
        }
        let mut paths = Vec::new();
        if src == dst && self.nodes.contains(src) {
            paths.push(vec![src.to_string()]);
        }
        if self.nodes.contains(src) && self.nodes.contains(dst) {
            let mut visited = HashSet::new();
            let mut path = vec![src.to_string()];
            visited.insert(src.to_string());
            self.dfs_paths(src, dst, &mut visited, &mut path, &mut paths);
        }
        let paths = std::rc::Rc::new(paths);
        self.path_cache.borrow_mut().put(key, paths.clone());
        paths
    }

    fn dfs_paths(
        &self,
        current: &str,
        dst: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
        out: &mut Vec<Vec<String>>,
    ) {
        if current == dst && path.len() > 1 {
            out.push(path.clone());
            return;
        }
        let Some(outs) = self.adjacency.get(current) else {
            return;
        };
        for (next, _id) in outs {
            if next == dst {
                path.push(next.clone());
                out.push(path.clone());
                path.pop();
                continue;
            }
            if visited.contains(next) {
                continue;
            }
            visited.insert(next.clone());
            path.push(next.clone());
            self.dfs_paths(next, dst, visited, path, out);
            path.pop();
            visited.remove(next);
        }
    }

    /// True iff at least one simple path connects `src` to `dst` (the
    /// `src == dst` case always holds for a node that exists in the graph).
    pub fn is_reachable(&self, src: &str, dst: &str) -> bool {
        !self.all_simple_paths(src, dst).is_empty()
    }
}

impl Default for LocationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_path_is_trivially_reachable() {
        let mut g = LocationGraph::new();
        g.add_node("A");
        assert!(g.is_reachable("A", "A"));
        let paths = g.all_simple_paths("A", "A");
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0], vec!["A".to_string()]);
    }

    #[test]
    fn finds_all_simple_paths_through_parallel_edges() {
        let mut g = LocationGraph::new();
        g.add_edge("A", "B", 0);
        g.add_edge("A", "B", 1);
        g.add_edge("B", "C", 2);
        let paths = g.all_simple_paths("A", "C");
        assert_eq!(paths.len(), 1, "parallel edges collapse to one vertex path");
        assert_eq!(paths[0], vec!["A", "B", "C"]);
    }

    #[test]
    fn no_path_when_disconnected() {
        let mut g = LocationGraph::new();
        g.add_node("A");
        g.add_node("B");
        assert!(!g.is_reachable("A", "B"));
    }

    #[test]
    fn avoids_repeated_vertices_on_cycles() {
        let mut g = LocationGraph::new();
        g.add_edge("A", "B", 0);
        g.add_edge("B", "A", 1);
        g.add_edge("B", "C", 2);
        let paths = g.all_simple_paths("A", "C");
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0], vec!["A", "B", "C"]);
    }

    #[test]
    fn cache_invalidated_by_mutation() {
        let mut g = LocationGraph::new();
        g.add_edge("A", "B", 0);
        assert!(g.is_reachable("A", "C") == false);
        g.add_edge("B", "C", 1);
        assert!(g.is_reachable("A", "C"));
    }

    #[test]
    fn edges_by_key_returns_endpoints() {
        let mut g = LocationGraph::new();
        g.add_edge("A", "B", 7);
        g.add_edge("A", "C", 9);
        let mut found = g.edges(&[7]);
        found.sort();
        assert_eq!(found, vec![("A".to_string(), "B".to_string(), 7)]);
    }
}
