//! Typed instruction stream: the dispatcher's input.
//!
//! The controlled-English front-end that would normally produce this stream
//! is out of scope here; instructions are transported as newline-delimited
//! JSON so the crate has a concrete, runnable boundary.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PathOp {
    /// shall always / shall invariantly
    Ag,
    /// shall eventually
    Af,
    /// might always / might potentially always
    Eg,
    /// might eventually / might possibly
    Ef,
}

impl PathOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PathOp::Ag => "A[]",
            PathOp::Af => "A<>",
            PathOp::Eg => "E[]",
            PathOp::Ef => "E<>",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelOp {
    MoreThan,
    MoreOrEqual,
    LessThan,
    LessOrEqual,
    Equal,
}

impl RelOp {
    /// Renders as a guard constraint string, any of the five relational
    /// shapes are admissible for guards.
    pub fn constraint(self, number: i64) -> String {
        let op = match self {
            RelOp::MoreThan => ">",
            RelOp::MoreOrEqual => ">=",
            RelOp::LessThan => "<",
            RelOp::LessOrEqual => "<=",
            RelOp::Equal => "==",
        };
        format!(" {op} {number}")
    }
}

/// The only two relops that ever phrase a location invariant ("cannot be
/// more than" / "cannot be more than or equal to"); an invariant is always
/// upper-bound shaped, so `LessThan`/`LessOrEqual`/`Equal` have no dual here
/// and are rejected at the wire boundary by not being a variant of this type.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvariantRelOp {
    MoreThan,
    MoreOrEqual,
}

impl InvariantRelOp {
    /// Flips into the upper-bound ("cannot exceed") dual rendered into the
    /// invariant string.
    pub fn as_upper_bound(self, number: i64) -> String {
        match self {
            InvariantRelOp::MoreThan => format!(" <= {number}"),
            InvariantRelOp::MoreOrEqual => format!(" < {number}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeCondition {
    pub entering: bool,
    pub location: String,
    pub relop: RelOp,
    pub number: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvariantCondition {
    pub relop: InvariantRelOp,
    pub number: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum Instruction {
    InitSingle {
        template: String,
        location: String,
    },
    InitMulti {
        template: String,
        locations: Vec<String>,
        initial: String,
    },
    SimpleTransition {
        template: String,
        from: Vec<String>,
        to: Vec<String>,
    },
    SynchSendTransition {
        template: String,
        channel: String,
        from: Vec<String>,
        to: Vec<String>,
    },
    SynchRecvCondTransition {
        template: String,
        channel: String,
        from: Vec<String>,
        to: Vec<String>,
    },
    TimeCondTransition {
        template: String,
        time_conds: Vec<TimeCondition>,
        from: Vec<String>,
        to: Vec<String>,
        #[serde(default)]
        send_channel: Option<String>,
    },
    SynchTimeCondTransition {
        template: String,
        channel: String,
        time_conds: Vec<TimeCondition>,
        from: Vec<String>,
        to: Vec<String>,
    },
    Invariant {
        template: String,
        locations: Vec<String>,
        inv_conds: Vec<InvariantCondition>,
    },
    QueryGeneral {
        template: String,
        path_op: PathOp,
        state_formula: String,
    },
    QueryDeadlock {
        variant: PathOp,
    },
    QueryLeadsTo {
        template: String,
        lhs_state_formula: String,
        rhs_state_formula: String,
    },
    QueryBoundedResponse {
        template: String,
        location: String,
        bound: i64,
    },
    QueryReachability {
        template: String,
        location: String,
    },
}
