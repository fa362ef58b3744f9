//! Flatten rich in-process values into a small tagged IR and rebuild them on
//! the other side.
//!
//! See [`flattener::standard`] for the registered helpers and [`wire`] for the
//! JSON encoding of the IR.
pub mod cli;
pub mod config;
pub mod error;
pub mod flattener;
pub mod helpers;
pub mod ir;
pub mod spill;
pub mod value;
pub mod wire;

pub use config::FlattenerConfig;
pub use error::{FlattenError, Result};
pub use flattener::{Helper, RootFlattener, flatten, global, standard, unflatten};
pub use ir::{Ir, TYPE_KEY, TaggedMap};
pub use value::Value;
