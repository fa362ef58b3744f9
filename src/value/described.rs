//! Values that know how to flatten themselves.
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::flattener::RootFlattener;
use crate::ir::Ir;

use super::{Value, ValueMap};

/// Implemented by the few values that produce their own representation.
///
/// The resulting IR must be something another helper can unflatten; the
/// self-describing helper itself never reconstructs.
pub trait SelfFlattening: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    fn flatten(&self, flattener: &RootFlattener) -> Result<Ir>;
}

/// Shared handle to a self-flattening value. Compares by identity.
#[derive(Debug, Clone)]
pub struct Described(Arc<dyn SelfFlattening>);

impl Described {
    pub fn new(inner: impl SelfFlattening + 'static) -> Self {
        Self(Arc::new(inner))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn flatten(&self, flattener: &RootFlattener) -> Result<Ir> {
        self.0.flatten(flattener)
    }
}

impl PartialEq for Described {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

/// Binned counts. Crosses the boundary as a plain map with
/// `edges` and `counts` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<i64>,
}

impl Histogram {
    /// `edges` must have one more entry than `counts`.
    pub fn new(edges: Vec<f64>, counts: Vec<i64>) -> Option<Self> {
        (edges.len() == counts.len() + 1).then_some(Self { edges, counts })
    }
}

impl SelfFlattening for Histogram {
    fn type_name(&self) -> &'static str {
        "Histogram"
    }

    fn flatten(&self, flattener: &RootFlattener) -> Result<Ir> {
        let mut map = ValueMap::new();
        map.insert("edges".into(), self.edges.clone().into());
        map.insert("counts".into(), self.counts.clone().into());
        flattener.flatten(&Value::Map(map))
    }
}
