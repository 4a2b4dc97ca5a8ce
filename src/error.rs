use std::fmt;

/// Errors surfaced by the builder and dispatcher.
///
/// Construction errors (unknown template/location, inconsistent instructions)
/// are recoverable: the dispatcher reports them and moves on to the next
/// instruction. `Internal` variants indicate a reduction invariant was
/// violated and are fatal for the template that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    UnknownTemplate(String),
    DuplicateTemplate(String),
    UnknownLocation {
        template: String,
        location: String,
    },
    InconsistentInit {
        template: String,
        initial: String,
    },
    DuplicateLocation {
        template: String,
        location: String,
    },
    AlreadyFinalized(String),
    UnknownClock {
        template: String,
        clock: String,
    },
    InvalidIdentifier(String),
    Internal(String),
}

impl BuildError {
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        BuildError::Internal(msg.into())
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownTemplate(name) => write!(f, "unknown template: {name}"),
            BuildError::DuplicateTemplate(name) => write!(f, "template '{name}' already exists"),
            BuildError::UnknownLocation { template, location } => {
                write!(f, "unknown location '{location}' in template '{template}'")
            }
            BuildError::InconsistentInit { template, initial } => write!(
                f,
                "initial location '{initial}' not among the declared locations of template '{template}'"
            ),
            BuildError::DuplicateLocation { template, location } => {
                write!(f, "duplicate location '{location}' in template '{template}'")
            }
            BuildError::AlreadyFinalized(name) => {
                write!(f, "template '{name}' was already finalized")
            }
            BuildError::UnknownClock { template, clock } => {
                write!(f, "unknown clock '{clock}' in template '{template}'")
            }
            BuildError::InvalidIdentifier(id) => write!(f, "invalid identifier: '{id}'"),
            BuildError::Internal(msg) => write!(f, "internal invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for BuildError {}

pub type BuildResult<T> = Result<T, BuildError>;
