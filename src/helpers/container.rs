//! Maps, sequences, and the array specialization pass.
use crate::error::{FlattenError, Result};
use crate::flattener::{Helper, RootFlattener};
use crate::ir::{Ir, TaggedMap};
use crate::value::{Capability, TypedArray, Value, ValueKind, ValueMap};

use super::{expect_tagged, not_claimed};

pub const MAP: &str = "Map";
const KEYS: &str = "keys";
const VALUES: &str = "values";

/// Any map. Keys may be arbitrary values, so keys and values travel as two
/// parallel arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapHelper;

impl Helper for MapHelper {
    fn type_name(&self) -> &'static str {
        MAP
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir> {
        let Value::Map(map) = value else {
            return Err(not_claimed(value));
        };
        let mut keys = Vec::with_capacity(map.len());
        let mut values = Vec::with_capacity(map.len());
        for (k, v) in map.iter() {
            keys.push(flattener.flatten(k)?);
            values.push(flattener.flatten(v)?);
        }
        Ok(TaggedMap::new(MAP)
            .with(KEYS, Ir::Array(keys))
            .with(VALUES, Ir::Array(values))
            .into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.is_tagged(MAP)
    }

    fn unflatten(&self, ir: &Ir, flattener: &RootFlattener) -> Result<Value> {
        let tagged = expect_tagged(ir, MAP)?;
        let keys = tagged.require_array(KEYS)?;
        let values = tagged.require_array(VALUES)?;
        if keys.len() != values.len() {
            return Err(FlattenError::malformed(
                MAP,
                format!("{} keys but {} values", keys.len(), values.len()),
            ));
        }
        let mut map = ValueMap::new();
        for (k, v) in keys.iter().zip(values) {
            let key = flattener.unflatten(k)?;
            if map.get(&key).is_some() {
                tracing::debug!(key = %key.type_name(), "map keys collide after unflatten; last one wins");
            }
            map.insert(key, flattener.unflatten(v)?);
        }
        Ok(Value::Map(map))
    }
}

/// Ordered sequences. Bare IR arrays identify themselves, so no tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListHelper;

impl Helper for ListHelper {
    fn type_name(&self) -> &'static str {
        "list"
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(
            value,
            Value::List(_)
                | Value::Array(TypedArray::Homogeneous { .. })
                | Value::Array(TypedArray::Common { .. })
        )
    }

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir> {
        let items = match value {
            Value::List(items)
            | Value::Array(TypedArray::Homogeneous { items, .. })
            | Value::Array(TypedArray::Common { items, .. }) => items,
            other => return Err(not_claimed(other)),
        };
        items
            .iter()
            .map(|item| flattener.flatten(item))
            .collect::<Result<Vec<_>>>()
            .map(Ir::Array)
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        matches!(ir, Ir::Array(_))
    }

    fn unflatten(&self, ir: &Ir, flattener: &RootFlattener) -> Result<Value> {
        let Ir::Array(xs) = ir else {
            return Err(FlattenError::UnsupportedRepresentation { description: ir.describe() });
        };
        let items = xs
            .iter()
            .map(|x| flattener.unflatten(x))
            .collect::<Result<Vec<_>>>()?;
        Ok(specialize(items))
    }
}

/// Agreement of one property across the non-null elements of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Agreement<T> {
    Unseen,
    All(T),
    Mixed,
}

impl<T: Copy + PartialEq> Agreement<T> {
    fn observe(self, next: Option<T>) -> Self {
        match (self, next) {
            (Agreement::Mixed, _) | (_, None) => Agreement::Mixed,
            (Agreement::Unseen, Some(x)) => Agreement::All(x),
            (Agreement::All(a), Some(b)) if a == b => Agreement::All(a),
            _ => Agreement::Mixed,
        }
    }
}

/// Narrow a freshly unflattened sequence.
///
/// All non-null elements of one exact kind give a homogeneous array; failing
/// that, one shared capability gives a capability array; otherwise the list
/// stays heterogeneous. Nulls never take part in the decision.
pub fn specialize(items: Vec<Value>) -> Value {
    let mut exact = Agreement::<ValueKind>::Unseen;
    let mut common = Agreement::<Capability>::Unseen;
    for item in items.iter().filter(|v| !v.is_null()) {
        exact = exact.observe(item.kind());
        common = common.observe(item.capability());
        if exact == Agreement::Mixed && common == Agreement::Mixed {
            break;
        }
    }
    let specialized = match (exact, common) {
        (Agreement::All(kind), _) => Value::Array(TypedArray::Homogeneous { kind, items }),
        (_, Agreement::All(capability)) => Value::Array(TypedArray::Common { capability, items }),
        _ => Value::List(items),
    };
    tracing::debug!(?exact, ?common, "specialized array");
    specialized
}

/// Arrays of one primitive kind, stored packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedArrayHelper {
    Bool,
    Int,
    Float,
}

impl PackedArrayHelper {
    fn claims(self, ir: &Ir) -> bool {
        match self {
            PackedArrayHelper::Bool => matches!(ir, Ir::Bool(_)),
            PackedArrayHelper::Int => matches!(ir, Ir::Int(_)),
            PackedArrayHelper::Float => matches!(ir, Ir::Float(_)),
        }
    }
}

impl Helper for PackedArrayHelper {
    fn type_name(&self) -> &'static str {
        match self {
            PackedArrayHelper::Bool => ValueKind::BoolArray.name(),
            PackedArrayHelper::Int => ValueKind::IntArray.name(),
            PackedArrayHelper::Float => ValueKind::FloatArray.name(),
        }
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PackedArrayHelper::Bool, Value::Array(TypedArray::Bool(_)))
                | (PackedArrayHelper::Int, Value::Array(TypedArray::Int(_)))
                | (PackedArrayHelper::Float, Value::Array(TypedArray::Float(_)))
        )
    }

    fn flatten(&self, value: &Value, _: &RootFlattener) -> Result<Ir> {
        let xs: Vec<Ir> = match (self, value) {
            (PackedArrayHelper::Bool, Value::Array(TypedArray::Bool(xs))) => {
                xs.iter().copied().map(Ir::Bool).collect()
            }
            (PackedArrayHelper::Int, Value::Array(TypedArray::Int(xs))) => {
                xs.iter().copied().map(Ir::Int).collect()
            }
            (PackedArrayHelper::Float, Value::Array(TypedArray::Float(xs))) => {
                xs.iter().copied().map(Ir::Float).collect()
            }
            (_, other) => return Err(not_claimed(other)),
        };
        Ok(Ir::Array(xs))
    }

    /// Empty arrays are left to the list helper: there is no kind to pack.
    fn can_unflatten(&self, ir: &Ir) -> bool {
        match ir {
            Ir::Array(xs) => !xs.is_empty() && xs.iter().all(|x| self.claims(x)),
            _ => false,
        }
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        let Ir::Array(xs) = ir else {
            return Err(FlattenError::UnsupportedRepresentation { description: ir.describe() });
        };
        let packed = match self {
            PackedArrayHelper::Bool => TypedArray::Bool(
                xs.iter().filter_map(|x| if let Ir::Bool(b) = x { Some(*b) } else { None }).collect(),
            ),
            PackedArrayHelper::Int => TypedArray::Int(
                xs.iter().filter_map(|x| if let Ir::Int(i) = x { Some(*i) } else { None }).collect(),
            ),
            PackedArrayHelper::Float => TypedArray::Float(
                xs.iter().filter_map(|x| if let Ir::Float(f) = x { Some(*f) } else { None }).collect(),
            ),
        };
        Ok(Value::Array(packed))
    }
}
