//! Renders path-operator queries and the bounded-response query template
//! from their typed instruction fields.

use crate::instruction::PathOp;

/// Qualifies a bare location/predicate with its owning template, unless it
/// already looks qualified (contains a `.`).
fn qualify(template: &str, formula: &str) -> String {
    if formula.contains('.') {
        formula.to_string()
    } else {
        format!("{template}.{formula}")
    }
}

pub fn general(template: &str, path_op: PathOp, state_formula: &str) -> String {
    format!("{} {}", path_op.symbol(), qualify(template, state_formula))
}

/// Every `QueryDeadlock` variant asks whether the system avoids deadlock;
/// only the quantifier over paths changes.
pub fn deadlock(variant: PathOp) -> String {
    format!("{} not deadlock", variant.symbol())
}

pub fn leads_to(template: &str, lhs_state_formula: &str, rhs_state_formula: &str) -> String {
    format!(
        "{} --> {}",
        qualify(template, lhs_state_formula),
        qualify(template, rhs_state_formula)
    )
}

pub fn reachability(template: &str, location: &str) -> String {
    format!("E<> {template}.{location}")
}

/// A bounded-response query is split around the spec clock's name, which is
/// only known once the owning template finalizes and the clock survives (or
/// is rewritten by) reduction.
pub struct BoundedResponseTemplate {
    prefix: String,
    suffix: String,
}

impl BoundedResponseTemplate {
    pub fn render(&self, clock_name: &str) -> String {
        format!("{}{}{}", self.prefix, clock_name, self.suffix)
    }
}

pub fn bounded_response_template(
    template: &str,
    location: &str,
    bound: i64,
) -> BoundedResponseTemplate {
    BoundedResponseTemplate {
        prefix: format!("A[] not {template}.{location} or "),
        suffix: format!(" <= {bound}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_qualifies_bare_formula() {
        assert_eq!(general("Traffic", PathOp::Ag, "Red"), "A[] Traffic.Red");
    }

    #[test]
    fn deadlock_ignores_template() {
        assert_eq!(deadlock(PathOp::Ag), "A[] not deadlock");
    }

    #[test]
    fn bounded_response_substitutes_surviving_clock() {
        let t = bounded_response_template("Traffic", "Red", 10);
        assert_eq!(t.render("x_3"), "A[] not Traffic.Red or x_3 <= 10");
    }
}
