//! Component D: the clock-reduction engine. Runs once, at template
//! finalize. Spec clocks are excluded from the whole pipeline and
//! reattached unchanged at the end.

pub mod conflict;
pub mod merge;
pub mod pruning;
pub mod splitting;

use crate::clock::Clock;
use crate::error::{BuildError, BuildResult};
use crate::template::Template;
use log::debug;
use std::collections::{HashMap, HashSet};

pub fn reduce(template: &mut Template) -> BuildResult<HashMap<String, HashSet<String>>> {
    let sources = template.transition_sources();
    let targets = template.transition_targets();

    let all_clocks: Vec<Clock> = template.clocks().to_vec();
    let mut mapping: HashMap<String, HashSet<String>> = all_clocks
        .iter()
        .map(|c| (c.name.clone(), HashSet::from([c.name.clone()])))
        .collect();

    let (spec_clocks, mut non_spec): (Vec<Clock>, Vec<Clock>) =
        all_clocks.into_iter().partition(|c| c.is_spec);

    debug!(
        "template {}: {} spec clocks set aside, {} clocks entering reduction",
        template.name,
        spec_clocks.len(),
        non_spec.len()
    );

    pruning::remove_unnecessary_resets(template.graph(), &sources, &targets, &mut non_spec);

    if non_spec.len() > 1 {
        let mut next_index = non_spec
            .iter()
            .chain(spec_clocks.iter())
            .filter_map(|c| c.name.strip_prefix("x_").and_then(|k| k.parse::<u32>().ok()))
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        let mut alloc_name = move || {
            let name = format!("x_{next_index}");
            next_index += 1;
            name
        };

        let split_outcome =
            splitting::split(template.graph(), &sources, &targets, non_spec, &mut alloc_name);
        for set in mapping.values_mut() {
            let replaced: HashSet<String> = set
                .iter()
                .flat_map(|name| {
                    split_outcome
                        .mapping_update
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| vec![name.clone()])
                })
                .collect();
            *set = replaced;
        }

        let merge_outcome =
            merge::merge(template.graph(), &sources, &targets, split_outcome.clocks);
        for set in mapping.values_mut() {
            let replaced: HashSet<String> = set
                .iter()
                .map(|name| {
                    merge_outcome
                        .representative
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| name.clone())
                })
                .collect();
            *set = replaced;
        }
        non_spec = merge_outcome.clocks;
    }

    let mut finalized = non_spec;
    finalized.extend(spec_clocks);

    for (original, surviving) in &mapping {
        if surviving.is_empty() {
            return Err(BuildError::internal(format!(
                "clock mapping for '{original}' lost all surviving clocks"
            )));
        }
        for name in surviving {
            if !finalized.iter().any(|c| &c.name == name) {
                return Err(BuildError::internal(format!(
                    "clock mapping for '{original}' references '{name}', which did not survive reduction"
                )));
            }
        }
    }

    *template.clocks_mut() = finalized;
    debug!(
        "template {}: reduction complete, {} clocks remain",
        template.name,
        template.clocks().len()
    );
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    #[test]
    fn independent_split_shards_merge_back_into_one_clock() {
        let mut t = Template::create(
            "Worker",
            vec!["Start".into(), "Mid".into(), "BranchA".into(), "BranchB".into()],
            "Start",
        )
        .unwrap();
        let reset = t.create_transition(&["Start".into()], &["Mid".into()], None, None).unwrap();
        let a = t.create_transition(&["Mid".into()], &["BranchA".into()], None, None).unwrap();
        let b = t.create_transition(&["Mid".into()], &["BranchB".into()], None, None).unwrap();
        let mut ids = a;
        ids.extend(b);
        let original =
            t.create_clock(Some((&ids, " > 3".to_string())), None, &reset, &[], false).unwrap();

        let mapping = reduce(&mut t).unwrap();

        // the two independent shards carry no conflict, so they merge back
        // down to a single clock, just possibly under a new name.
        assert_eq!(t.clocks().len(), 1);
        let surviving = &mapping[&original];
        assert_eq!(surviving.len(), 1);
        assert!(t.clocks().iter().any(|c| &c.name == surviving.iter().next().unwrap()));
    }

    #[test]
    fn spec_clock_bypasses_reduction_untouched() {
        let mut t = Template::create("Worker", vec!["Idle".into(), "Done".into()], "Idle").unwrap();
        let enter = t.create_transition(&["Idle".into()], &["Done".into()], None, None).unwrap();
        let spec_name = t.create_clock(None, None, &enter, &[], true).unwrap();

        let mapping = reduce(&mut t).unwrap();

        assert_eq!(mapping[&spec_name], HashSet::from([spec_name.clone()]));
        assert!(t.clocks().iter().any(|c| c.name == spec_name && c.is_spec));
    }
}
