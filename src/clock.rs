//! Component B: per-clock record.
//!
//! Pure data. Equality/hashing is by clock name, since two `Clock` values
//! with the same name are always meant to be the same clock (the builder
//! never creates two live clocks sharing a name).

use crate::graph::TransitionId;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// A guard/reset is always attached to one concrete transition, identified
/// by its id (ids are unique per template).
pub type GuardKey = TransitionId;

#[derive(Debug, Clone)]
pub struct Clock {
    pub name: String,
    /// transition id -> constraint strings (e.g. `" > 3"`), any relop.
    pub guards: HashMap<GuardKey, Vec<String>>,
    /// location name -> constraint strings, upper-bound shaped only.
    pub invariants: HashMap<String, Vec<String>>,
    /// transitions on which this clock is reset to zero.
    pub resets: HashSet<TransitionId>,
    /// spec clocks exist only to express a query and bypass reduction.
    pub is_spec: bool,
}

impl Clock {
    pub fn new(name: impl Into<String>, is_spec: bool) -> Self {
        Clock {
            name: name.into(),
            guards: HashMap::new(),
            invariants: HashMap::new(),
            resets: HashSet::new(),
            is_spec,
        }
    }

    pub fn add_guard(&mut self, transition: GuardKey, constraint: impl Into<String>) {
        self.guards.entry(transition).or_default().push(constraint.into());
    }

    pub fn add_invariant(&mut self, location: impl Into<String>, constraint: impl Into<String>) {
        self.invariants.entry(location.into()).or_default().push(constraint.into());
    }

    /// Adds a reset, deduplicated by transition id.
    pub fn add_reset(&mut self, transition: TransitionId) {
        self.resets.insert(transition);
    }

    /// All locations this clock's guards originate from, i.e. the source
    /// location of every guarded transition. Resolved via `sources`, a
    /// transition-id -> source-location lookup supplied by the template
    /// (the clock record itself only knows transition ids).
    pub fn guard_source_locations(&self, sources: &HashMap<TransitionId, String>) -> Vec<String> {
        self.guards
            .keys()
            .filter_map(|id| sources.get(id).cloned())
            .collect()
    }

    pub fn control_locations(&self, sources: &HashMap<TransitionId, String>) -> Vec<String> {
        let mut locs = self.guard_source_locations(sources);
        locs.extend(self.invariants.keys().cloned());
        locs
    }

    pub fn is_empty_of_constraints(&self) -> bool {
        self.guards.is_empty() && self.invariants.is_empty()
    }
}

impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Clock {}

impl Hash for Clock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_dedup_is_not_automatic_but_reset_is() {
        let mut c = Clock::new("x_0", false);
        c.add_reset(1);
        c.add_reset(1);
        assert_eq!(c.resets.len(), 1);
        c.add_guard(2, " > 3");
        c.add_guard(2, " > 3");
        assert_eq!(c.guards[&2].len(), 2, "guard list is append-only per spec");
    }

    #[test]
    fn equality_is_by_name_only() {
        let a = Clock::new("x_0", false);
        let mut b = Clock::new("x_0", true);
        b.add_reset(5);
        assert_eq!(a, b);
    }
}
