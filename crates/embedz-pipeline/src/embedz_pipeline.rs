//! Block processing for pandoc-embedz
//!
//! [`Embedz`] runs every block of a document through the same sequence:
//!
//! ```text
//! Block ──► resolve config ──► fragments / preamble ──► query expansion
//!                                                          │
//!      render ◄── definition-only? ◄── bind/global/alias ◄── load data
//! ```
//!
//! All state a block leaves behind (global variables, saved fragments, the
//! preamble, whether stdin was read) lives in an [`EmbedzState`] owned by the
//! caller, so independent runs never share anything.

mod block;
mod data;
mod diagnostics;
mod embedz;
mod state;

#[cfg(test)]
mod tests;

pub use block::{Block, EMBEDZ_CLASS, Host};
pub use data::STDIN_SOURCE;
pub use diagnostics::{
    DiagnosticSink, FailureContext, FailureMode, MemorySink, TEST_MODE_ENV, bug_report,
    failure_report,
};
pub use embedz::{Embedz, StandaloneOverrides};
pub use state::{EmbedzState, StdinSource};
