//! Component G: the instruction dispatcher.
//!
//! Consumes one `Instruction` at a time against a `Session`, in the order
//! they arrive. A construction error on one instruction is reported and the
//! session keeps going: dispatch is a single match over the instruction tag,
//! one arm per named variant of `Instruction`.
//!
//! Bounded-response queries reference a spec clock that doesn't get a final
//! name until its template finalizes, so they're buffered here and only
//! rendered once `finalize` runs, substituting in whichever clock name(s)
//! survived reduction.
//!
//! Time-/invariant-condition resets name a location rather than a concrete
//! transition, and a later instruction can still add a new edge into or out
//! of that location, so those resets are handed to the template as
//! `ResetMarker`s and only resolved once the template's transition list is
//! complete, inside `Template::finalize`.

use crate::error::{BuildError, BuildResult};
use crate::instruction::Instruction;
use crate::query::{self, BoundedResponseTemplate};
use crate::registry::Session;
use crate::template::{normalize_name, validate_identifier, ResetMarker};
use std::collections::HashMap;

struct PendingBounded {
    template: String,
    clock_name: String,
    rendering: BoundedResponseTemplate,
}

#[derive(Default)]
pub struct Dispatcher {
    ready_queries: Vec<String>,
    pending_bounded: Vec<PendingBounded>,
}

fn norm_all(names: &[String]) -> Vec<String> {
    names.iter().map(|n| normalize_name(n)).collect()
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    pub fn process(&mut self, session: &mut Session, instr: Instruction) -> BuildResult<()> {
        match instr {
            Instruction::InitSingle { template, location } => {
                let loc = normalize_name(&location);
                session.create_template(&template, vec![loc.clone()], &loc)
            }
            Instruction::InitMulti { template, locations, initial } => {
                session.create_template(&template, norm_all(&locations), &normalize_name(&initial))
            }
            Instruction::SimpleTransition { template, from, to } => {
                session
                    .template_mut(&template)?
                    .create_transition(&norm_all(&from), &norm_all(&to), None, None)
                    .map(|_| ())
            }
            Instruction::SynchSendTransition { template, channel, from, to } => {
                validate_identifier(&channel)?;
                session
                    .template_mut(&template)?
                    .create_transition(&norm_all(&from), &norm_all(&to), None, Some(&channel))
                    .map(|_| ())
            }
            Instruction::SynchRecvCondTransition { template, channel, from, to } => {
                validate_identifier(&channel)?;
                session
                    .template_mut(&template)?
                    .create_transition(&norm_all(&from), &norm_all(&to), Some(&channel), None)
                    .map(|_| ())
            }
            Instruction::TimeCondTransition { template, time_conds, from, to, send_channel } => {
                if let Some(ch) = &send_channel {
                    validate_identifier(ch)?;
                }
                let t = session.template_mut(&template)?;
                let created = t.create_transition(
                    &norm_all(&from),
                    &norm_all(&to),
                    None,
                    send_channel.as_deref(),
                )?;
                for cond in time_conds {
                    let loc = normalize_name(&cond.location);
                    let markers = [ResetMarker { entering: cond.entering, location: loc }];
                    t.create_clock(
                        Some((&created, cond.relop.constraint(cond.number))),
                        None,
                        &[],
                        &markers,
                        false,
                    )?;
                }
                Ok(())
            }
            Instruction::SynchTimeCondTransition { template, channel, time_conds, from, to } => {
                validate_identifier(&channel)?;
                let t = session.template_mut(&template)?;
                let created =
                    t.create_transition(&norm_all(&from), &norm_all(&to), Some(&channel), None)?;
                for cond in time_conds {
                    let loc = normalize_name(&cond.location);
                    let markers = [ResetMarker { entering: cond.entering, location: loc }];
                    t.create_clock(
                        Some((&created, cond.relop.constraint(cond.number))),
                        None,
                        &[],
                        &markers,
                        false,
                    )?;
                }
                Ok(())
            }
            Instruction::Invariant { template, locations, inv_conds } => {
                let locs = norm_all(&locations);
                let t = session.template_mut(&template)?;
                let markers: Vec<ResetMarker> = locs
                    .iter()
                    .map(|l| ResetMarker { entering: true, location: l.clone() })
                    .collect();
                for cond in inv_conds {
                    t.create_clock(
                        None,
                        Some((&locs, cond.relop.as_upper_bound(cond.number))),
                        &[],
                        &markers,
                        false,
                    )?;
                }
                Ok(())
            }
            Instruction::QueryGeneral { template, path_op, state_formula } => {
                let t = session.template(&template)?;
                self.ready_queries.push(query::general(&t.name, path_op, &state_formula));
                Ok(())
            }
            Instruction::QueryDeadlock { variant } => {
                self.ready_queries.push(query::deadlock(variant));
                Ok(())
            }
            Instruction::QueryLeadsTo { template, lhs_state_formula, rhs_state_formula } => {
                let t = session.template(&template)?;
                self.ready_queries
                    .push(query::leads_to(&t.name, &lhs_state_formula, &rhs_state_formula));
                Ok(())
            }
            Instruction::QueryReachability { template, location } => {
                let loc = normalize_name(&location);
                let t = session.template(&template)?;
                if !t.locations().contains(&loc) {
                    return Err(BuildError::UnknownLocation { template: t.name.clone(), location: loc });
                }
                self.ready_queries.push(query::reachability(&t.name, &loc));
                Ok(())
            }
            Instruction::QueryBoundedResponse { template, location, bound } => {
                let loc = normalize_name(&location);
                let t = session.template_mut(&template)?;
                if !t.locations().contains(&loc) {
                    return Err(BuildError::UnknownLocation { template: t.name.clone(), location: loc });
                }
                let markers = [ResetMarker { entering: true, location: loc.clone() }];
                let clock_name = t.create_clock(None, None, &[], &markers, true)?;
                self.pending_bounded.push(PendingBounded {
                    template: t.name.clone(),
                    clock_name,
                    rendering: query::bounded_response_template(&t.name, &loc, bound),
                });
                Ok(())
            }
        }
    }

    /// Finalizes every template in the session and resolves every buffered
    /// bounded-response query against the returned clock-rewrite mappings.
    /// Returns the per-template finalize errors, if any; finalization of one
    /// template never blocks another's.
    pub fn finalize(&mut self, session: &mut Session) -> Vec<(String, BuildError)> {
        let results = session.finalize_all();
        let mut errors = Vec::new();
        let mut mappings = HashMap::new();
        for (name, result) in results {
            match result {
                Ok(mapping) => {
                    mappings.insert(name, mapping);
                }
                Err(e) => errors.push((name, e)),
            }
        }

        for pending in std::mem::take(&mut self.pending_bounded) {
            match mappings.get(&pending.template).and_then(|m| m.get(&pending.clock_name)) {
                Some(representatives) => {
                    for name in representatives {
                        self.ready_queries.push(pending.rendering.render(name));
                    }
                }
                None => self.ready_queries.push(pending.rendering.render(&pending.clock_name)),
            }
        }
        errors
    }

    pub fn queries(&self) -> &[String] {
        &self.ready_queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_channel_name_is_rejected() {
        let mut session = Session::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .process(
                &mut session,
                Instruction::InitMulti {
                    template: "Sender".into(),
                    locations: vec!["Idle".into(), "Done".into()],
                    initial: "Idle".into(),
                },
            )
            .unwrap();
        let err = dispatcher
            .process(
                &mut session,
                Instruction::SynchSendTransition {
                    template: "Sender".into(),
                    channel: "beep!".into(),
                    from: vec!["Idle".into()],
                    to: vec!["Done".into()],
                },
            )
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidIdentifier(_)));
    }

    #[test]
    fn simple_pipeline_produces_a_query() {
        let mut session = Session::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .process(
                &mut session,
                Instruction::InitMulti {
                    template: "Traffic".into(),
                    locations: vec!["Red".into(), "Green".into()],
                    initial: "Red".into(),
                },
            )
            .unwrap();
        dispatcher
            .process(
                &mut session,
                Instruction::SimpleTransition {
                    template: "Traffic".into(),
                    from: vec!["Red".into()],
                    to: vec!["Green".into()],
                },
            )
            .unwrap();
        dispatcher
            .process(
                &mut session,
                Instruction::QueryReachability { template: "Traffic".into(), location: "Green".into() },
            )
            .unwrap();
        let errors = dispatcher.finalize(&mut session);
        assert!(errors.is_empty());
        assert_eq!(dispatcher.queries(), &["E<> Traffic.Green".to_string()]);
    }

    #[test]
    fn bounded_response_rewrites_to_surviving_clock() {
        let mut session = Session::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .process(
                &mut session,
                Instruction::InitMulti {
                    template: "Traffic".into(),
                    locations: vec!["Red".into(), "Green".into()],
                    initial: "Red".into(),
                },
            )
            .unwrap();
        dispatcher
            .process(
                &mut session,
                Instruction::SimpleTransition {
                    template: "Traffic".into(),
                    from: vec!["Red".into()],
                    to: vec!["Green".into()],
                },
            )
            .unwrap();
        dispatcher
            .process(
                &mut session,
                Instruction::QueryBoundedResponse {
                    template: "Traffic".into(),
                    location: "Green".into(),
                    bound: 10,
                },
            )
            .unwrap();
        let errors = dispatcher.finalize(&mut session);
        assert!(errors.is_empty());
        assert_eq!(dispatcher.queries().len(), 1);
        assert!(dispatcher.queries()[0].starts_with("A[] not Traffic.Green or x_"));
        assert!(dispatcher.queries()[0].ends_with("<= 10"));
    }
}
