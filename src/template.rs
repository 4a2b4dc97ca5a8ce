//! Component C: template builder.
//!
//! Owns one template's graph, clocks and committed-location bookkeeping.
//! Mutation is only valid before `finalize`; once finalized the builder is
//! done.

use crate::clock::Clock;
use crate::error::{BuildError, BuildResult};
use crate::graph::{LocationGraph, TransitionId};
use crate::reduction;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

/// Checks a raw name arriving over the instruction-stream boundary (a
/// template, location or channel name) before it is trusted anywhere else;
/// there is no grammar parser upstream guaranteeing this, so the builder
/// enforces it itself.
pub fn validate_identifier(raw: &str) -> BuildResult<()> {
    if IDENTIFIER.is_match(raw) {
        Ok(())
    } else {
        Err(BuildError::InvalidIdentifier(raw.to_string()))
    }
}

/// Synthetic pre-initial location. Never named by the user, excluded from
/// the user-visible location list, carries the implicit reset every clock
/// gets at template entry.
pub const LOCATION_ZERO: &str = "LocationZero";

/// Sentinel transition id for the `LocationZero -> initial` bootstrap edge.
/// Never produced by the monotonic per-template id counter, which starts
/// at 0, so it can never collide with a user-level transition id.
pub const BOOTSTRAP_TRANSITION: TransitionId = TransitionId::MAX;

/// Normalizes a location/template/channel name to TitleCase. Two names that
/// differ only in case normalize to the same string and therefore alias;
/// this is a deliberate policy, not an oversight.
pub fn normalize_name(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub id: TransitionId,
    pub source: String,
    pub target: String,
    pub recv: Option<String>,
    pub send: Option<String>,
}

/// An unresolved reset descriptor: "every transition entering/leaving this
/// location", attached to a clock before the template's transition list is
/// complete. Resolved against the final list in `finalize`, before the
/// reduction pipeline runs, so a transition created after the clock still
/// counts.
#[derive(Debug, Clone)]
pub struct ResetMarker {
    pub entering: bool,
    pub location: String,
}

pub struct Template {
    pub name: String,
    pub initial: String,
    /// User-visible locations plus builder-allocated committed locations;
    /// `LocationZero` is intentionally excluded.
    locations: Vec<String>,
    committed: HashSet<String>,
    graph: LocationGraph,
    transitions: Vec<Transition>,
    next_transition_id: TransitionId,
    committed_count: u32,
    clocks: Vec<Clock>,
    next_clock_index: u32,
    channels: HashSet<String>,
    finalized: bool,
    /// clock name -> its unresolved reset markers, resolved in `finalize`.
    pending_resets: Vec<(String, Vec<ResetMarker>)>,
}

impl Template {
    /// Creates a template with the given (pre-normalization) locations and
    /// initial location. Adds the synthetic `LocationZero` vertex and its
    /// bootstrap edge into `initial`.
    pub fn create(
        name: impl Into<String>,
        locations: Vec<String>,
        initial: impl Into<String>,
    ) -> BuildResult<Template> {
        let name = name.into();
        let raw_initial = initial.into();
        validate_identifier(&raw_initial)?;
        let initial = normalize_name(&raw_initial);

        let mut unique = Vec::new();
        let mut seen = HashSet::new();
        for loc in locations {
            validate_identifier(&loc)?;
            let n = normalize_name(&loc);
            if seen.insert(n.clone()) {
                unique.push(n);
            }
        }
        if !unique.contains(&initial) {
            return Err(BuildError::InconsistentInit {
                template: name,
                initial,
            });
        }

        let mut graph = LocationGraph::new();
        for loc in &unique {
            graph.add_node(loc);
        }
        graph.add_node(LOCATION_ZERO);
        graph.add_edge(LOCATION_ZERO, &initial, BOOTSTRAP_TRANSITION);

        Ok(Template {
            name,
            initial,
            locations: unique,
            committed: HashSet::new(),
            graph,
            transitions: Vec::new(),
            next_transition_id: 0,
            committed_count: 0,
            clocks: Vec::new(),
            next_clock_index: 0,
            channels: HashSet::new(),
            finalized: false,
            pending_resets: Vec::new(),
        })
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn is_committed(&self, location: &str) -> bool {
        self.committed.contains(location)
    }

    pub fn channels(&self) -> impl Iterator<Item = &String> {
        self.channels.iter()
    }

    fn check_not_finalized(&self) -> BuildResult<()> {
        if self.finalized {
            Err(BuildError::AlreadyFinalized(self.name.clone()))
        } else {
            Ok(())
        }
    }

    fn check_location(&self, location: &str) -> BuildResult<()> {
        if self.locations.contains(&location.to_string()) {
            Ok(())
        } else {
            Err(BuildError::UnknownLocation {
                template: self.name.clone(),
                location: location.to_string(),
            })
        }
    }

    fn allocate_transition_id(&mut self) -> TransitionId {
        let id = self.next_transition_id;
        self.next_transition_id += 1;
        id
    }

    fn new_committed_location(&mut self) -> String {
        let name = format!("C{}", self.committed_count);
        self.committed_count += 1;
        self.locations.push(name.clone());
        self.committed.insert(name.clone());
        self.graph.add_node(&name);
        name
    }

    fn resolve(&self, side: &[String]) -> Vec<String> {
        if side.is_empty() {
            self.locations.clone()
        } else {
            side.to_vec()
        }
    }

    /// Creates transitions from `src` to `dst` (both lists of already
    /// user-chosen, normalized location names; an empty list means "all
    /// current locations", both empty means the Cartesian product).
    ///
    /// If both `recv` and `send` are given, inserts one fresh committed
    /// location per `(s, t)` pair so the composite transition is atomic:
    /// the receive edge enters it, the send edge leaves it.
    ///
    /// Returns every transition id created by this call; a clock
    /// constraint attached afterwards for this user-level transition is
    /// meant to apply to every id in the returned list.
    pub fn create_transition(
        &mut self,
        src: &[String],
        dst: &[String],
        recv: Option<&str>,
        send: Option<&str>,
    ) -> BuildResult<Vec<TransitionId>> {
        self.check_not_finalized()?;
        let srcs = self.resolve(src);
        let dsts = self.resolve(dst);
        for s in &srcs {
            self.check_location(s)?;
        }
        for d in &dsts {
            self.check_location(d)?;
        }

        if let Some(ch) = recv {
            self.channels.insert(ch.to_string());
        }
        if let Some(ch) = send {
            self.channels.insert(ch.to_string());
        }

        let mut created = Vec::new();
        match (recv, send) {
            (Some(recv), Some(send)) => {
                for s in &srcs {
                    for d in &dsts {
                        let committed = self.new_committed_location();
                        let recv_id = self.allocate_transition_id();
                        self.graph.add_edge(s, &committed, recv_id);
                        self.transitions.push(Transition {
                            id: recv_id,
                            source: s.clone(),
                            target: committed.clone(),
                            recv: Some(recv.to_string()),
                            send: None,
                        });
                        let send_id = self.allocate_transition_id();
                        self.graph.add_edge(&committed, d, send_id);
                        self.transitions.push(Transition {
                            id: send_id,
                            source: committed.clone(),
                            target: d.clone(),
                            recv: None,
                            send: Some(send.to_string()),
                        });
                        created.push(recv_id);
                        created.push(send_id);
                    }
                }
            }
            _ => {
                for s in &srcs {
                    for d in &dsts {
                        let id = self.allocate_transition_id();
                        self.graph.add_edge(s, d, id);
                        self.transitions.push(Transition {
                            id,
                            source: s.clone(),
                            target: d.clone(),
                            recv: recv.map(str::to_string),
                            send: send.map(str::to_string),
                        });
                        created.push(id);
                    }
                }
            }
        }
        Ok(created)
    }

    pub(crate) fn next_clock_name(&mut self) -> String {
        let name = format!("x_{}", self.next_clock_index);
        self.next_clock_index += 1;
        name
    }

    /// Creates a new clock. `guard` attaches the same constraint string to
    /// every given transition id; `invariant` attaches the same (upper
    /// bound) constraint string to every given location. `resets` is the
    /// set of already-created transitions on which the clock is set to
    /// zero; `reset_markers` additionally names entering/leaving-location
    /// resets that can't be resolved yet because the template may still
    /// grow more edges into or out of that location, and are resolved in
    /// `finalize` instead. The `LocationZero -> initial` reset is always
    /// added, deduplicated.
    pub fn create_clock(
        &mut self,
        guard: Option<(&[TransitionId], String)>,
        invariant: Option<(&[String], String)>,
        resets: &[TransitionId],
        reset_markers: &[ResetMarker],
        is_spec: bool,
    ) -> BuildResult<String> {
        self.check_not_finalized()?;
        let name = self.next_clock_name();
        let mut clock = Clock::new(name.clone(), is_spec);
        if let Some((ids, cond)) = guard {
            for id in ids {
                clock.add_guard(*id, cond.clone());
            }
        }
        if let Some((locs, cond)) = invariant {
            for l in locs {
                self.check_location(l)?;
                clock.add_invariant(l.clone(), cond.clone());
            }
        }
        for r in resets {
            clock.add_reset(*r);
        }
        clock.add_reset(BOOTSTRAP_TRANSITION);
        self.clocks.push(clock);
        if !reset_markers.is_empty() {
            self.pending_resets.push((name.clone(), reset_markers.to_vec()));
        }
        Ok(name)
    }

    /// Resolves every deferred entering/leaving-location reset marker
    /// against the complete, final transition list. Must run before the
    /// reduction pipeline, which only ever sees concrete reset ids.
    fn resolve_pending_resets(&mut self) {
        for (clock_name, markers) in std::mem::take(&mut self.pending_resets) {
            let mut ids = HashSet::new();
            for marker in &markers {
                for t in &self.transitions {
                    let hit = if marker.entering {
                        t.target == marker.location
                    } else {
                        t.source == marker.location
                    };
                    if hit {
                        ids.insert(t.id);
                    }
                }
            }
            if let Ok(clock) = self.get_clock_mut(&clock_name) {
                for id in ids {
                    clock.add_reset(id);
                }
            }
        }
    }

    pub fn get_clock_mut(&mut self, name: &str) -> BuildResult<&mut Clock> {
        self.clocks
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| BuildError::UnknownClock {
                template: self.name.clone(),
                clock: name.to_string(),
            })
    }

    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition_sources(&self) -> HashMap<TransitionId, String> {
        let mut m: HashMap<TransitionId, String> = self
            .transitions
            .iter()
            .map(|t| (t.id, t.source.clone()))
            .collect();
        m.insert(BOOTSTRAP_TRANSITION, LOCATION_ZERO.to_string());
        m
    }

    pub fn transition_targets(&self) -> HashMap<TransitionId, String> {
        let mut m: HashMap<TransitionId, String> = self
            .transitions
            .iter()
            .map(|t| (t.id, t.target.clone()))
            .collect();
        m.insert(BOOTSTRAP_TRANSITION, self.initial.clone());
        m
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Runs the reduction pipeline once and returns the finalized clock set
    /// together with the clock-rewrite mapping. Idempotent calls after the
    /// first return `AlreadyFinalized`.
    pub fn finalize(&mut self) -> BuildResult<HashMap<String, HashSet<String>>> {
        self.check_not_finalized()?;
        self.resolve_pending_resets();
        let mapping = reduction::reduce(self)?;
        self.finalized = true;
        Ok(mapping)
    }

    pub fn clocks(&self) -> &[Clock] {
        &self.clocks
    }

    pub(crate) fn clocks_mut(&mut self) -> &mut Vec<Clock> {
        &mut self.clocks
    }
}
