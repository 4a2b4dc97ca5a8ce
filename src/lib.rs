//! A compiler from a typed timed-automaton instruction stream to a
//! reduced-clock UPPAAL NTA document.
//!
//! Component map: `graph` (A) holds the location multi-digraph, `clock` (B)
//! is the per-clock record, `template` (C) is the per-template builder,
//! `reduction` (D) runs the prune/split/merge pipeline once at finalize,
//! `emitter` (E) renders a finalized session to XML, `registry` (F) is the
//! `Session` that owns every template, and `instruction`/`query`/
//! `dispatcher` (G) turn a stream of typed instructions into a built
//! session plus a list of queries.

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod emitter;
pub mod error;
pub mod graph;
pub mod instruction;
pub mod query;
pub mod reduction;
pub mod registry;
pub mod template;

pub use dispatcher::Dispatcher;
pub use error::{BuildError, BuildResult};
pub use instruction::Instruction;
pub use registry::Session;
