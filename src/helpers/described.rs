//! Values that flatten themselves.
use crate::error::{FlattenError, Result};
use crate::flattener::{Helper, RootFlattener};
use crate::ir::Ir;
use crate::value::Value;

use super::not_claimed;

/// Flatten-only: whatever the value emits is unflattened by the helper that
/// owns the resulting tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfDescribingHelper;

impl Helper for SelfDescribingHelper {
    fn type_name(&self) -> &'static str {
        "SelfDescribing"
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::Described(_))
    }

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir> {
        match value {
            Value::Described(described) => described.flatten(flattener),
            other => Err(not_claimed(other)),
        }
    }

    fn can_unflatten(&self, _: &Ir) -> bool {
        false
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        tracing::error!(ir = %ir.describe(), "self-describing helper asked to unflatten");
        Err(FlattenError::Unreachable { helper: self.type_name() })
    }
}
