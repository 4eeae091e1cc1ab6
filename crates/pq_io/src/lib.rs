//! crates/pq_io/src/lib.rs
//! Contest file I/O.
//!
//! - `contest`: the on-disk shape of a contest (schedules, tables, entries, questions).
//! - `loader`: read + structural validation, returning a typed `Contest`.
//! - `canonical_json` / `archive`: compact, key-sorted JSON written atomically.
//!
//! Nothing here scores anything; tables are built from their documents on demand.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for pq_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (read, create_dir_all, rename, fsync).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON (de)serialization errors with a JSON Pointer-ish location.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Contest-level validation (duplicate ids, dangling references, ...).
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json reports line/column, not a pointer.
        IoError::Json {
            pointer: format!("line {} column {}", e.line(), e.column()),
            msg: e.to_string(),
        }
    }
}

pub mod archive;
pub mod canonical_json;
pub mod contest;
pub mod loader;

pub use contest::{
    Contest, CriterionDoc, EntryDoc, QuestionDoc, QuestionKind, ResponseDoc, RowDoc, ScheduleRef,
    TableDoc, TieBreakerDoc,
};
pub use loader::{load_contest, parse_contest, validate_contest};

pub mod prelude {
    pub use crate::{load_contest, Contest, IoError, IoResult, QuestionDoc, QuestionKind};
    pub use crate::archive::{round_value, standings_value, write_archive};
    pub use crate::canonical_json::{to_canonical_json_bytes, write_canonical_file};
}
