//! Error taxonomy of the flattening codec.
//!
//! Every helper failure propagates straight to the caller of
//! [`RootFlattener::flatten`](crate::flattener::RootFlattener::flatten) /
//! [`RootFlattener::unflatten`](crate::flattener::RootFlattener::unflatten).
//! The only soft failures (typed-null degradation, state map type mismatches,
//! temp-file deletion) are logged and never surface here.

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, FlattenError>;

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    /// No registered helper claims the value.
    #[error("no helper can flatten a value of type `{type_name}`")]
    UnsupportedType { type_name: String },

    /// No registered helper claims the IR node.
    #[error("no helper can unflatten {description}")]
    UnsupportedRepresentation { description: String },

    /// A claimed representation is missing fields or is inconsistent.
    #[error("malformed `{type_key}` representation: {reason}")]
    MalformedRepresentation { type_key: String, reason: String },

    #[error("unknown {category} enumerant `{name}`")]
    UnknownEnumerant { category: &'static str, name: String },

    #[error("spill file `{}`: {source}", path.display())]
    SpillIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A flatten-only helper was asked to unflatten. Always a dispatch bug.
    #[error("helper `{helper}` cannot unflatten; it is flatten-only")]
    Unreachable { helper: &'static str },

    #[error("invalid IR document: {0}")]
    Wire(String),
}

impl FlattenError {
    pub fn malformed(type_key: impl Into<String>, reason: impl Into<String>) -> Self {
        FlattenError::MalformedRepresentation {
            type_key: type_key.into(),
            reason: reason.into(),
        }
    }

    pub fn spill_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FlattenError::SpillIo { path: path.into(), source }
    }
}
