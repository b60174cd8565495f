//! embedz Core - shared types for the embedz document filter
//!
//! This crate provides the pieces every other embedz crate depends on:
//!
//! - `Value` / `Mapping` - the tagged-union value flowing through config,
//!   loaded data, bind results and the render context
//! - `EmbedzError` - the error taxonomy with its recognized/unrecognized split
//! - `deep_merge` - recursive mapping merge used by config resolution
//! - `lookup_path` / `assign_path` - dotted-path access into mappings
//! - `validate_file_path` - existence check for referenced files

mod error;
mod fs;
mod merge;
mod path;
mod value;

pub use error::*;
pub use fs::validate_file_path;
pub use merge::deep_merge;
pub use path::{assign_path, lookup_path};
pub use value::*;
