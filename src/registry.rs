//! Component F: the NTA registry.
//!
//! Owns every template in the system under construction, plus the order
//! they were declared in (the `system T1, T2, ...;` line must list them in
//! that order). One explicit owned value rather than process-global mutable
//! state: a caller can hold as many independent `Session`s as it likes.

use crate::error::{BuildError, BuildResult};
use crate::template::{normalize_name, validate_identifier, Template};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct Session {
    templates: HashMap<String, Template>,
    order: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            templates: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn create_template(
        &mut self,
        name: &str,
        locations: Vec<String>,
        initial: &str,
    ) -> BuildResult<()> {
        validate_identifier(name)?;
        let name = normalize_name(name);
        if self.templates.contains_key(&name) {
            return Err(BuildError::DuplicateTemplate(name));
        }
        let template = Template::create(name.clone(), locations, initial)?;
        self.order.push(name.clone());
        self.templates.insert(name, template);
        Ok(())
    }

    pub fn template(&self, name: &str) -> BuildResult<&Template> {
        let name = normalize_name(name);
        self.templates
            .get(&name)
            .ok_or_else(|| BuildError::UnknownTemplate(name))
    }

    pub fn template_mut(&mut self, name: &str) -> BuildResult<&mut Template> {
        let name = normalize_name(name);
        self.templates
            .get_mut(&name)
            .ok_or_else(|| BuildError::UnknownTemplate(name))
    }

    /// Declaration order, i.e. the order the `system` line must list them in.
    pub fn template_names(&self) -> &[String] {
        &self.order
    }

    /// Finalizes every template that isn't finalized yet. Each template is
    /// independent, so one's reduction failing does not stop the rest.
    pub fn finalize_all(&mut self) -> Vec<(String, BuildResult<HashMap<String, HashSet<String>>>)> {
        self.order
            .iter()
            .filter_map(|name| {
                let template = self.templates.get_mut(name)?;
                if template.is_finalized() {
                    return None;
                }
                Some((name.clone(), template.finalize()))
            })
            .collect()
    }

    pub fn all_finalized(&self) -> bool {
        self.order
            .iter()
            .all(|n| self.templates.get(n).is_some_and(Template::is_finalized))
    }
}
