//! Scalars and nulls.
use crate::error::{FlattenError, Result};
use crate::flattener::{Helper, RootFlattener};
use crate::ir::{Ir, TaggedMap};
use crate::value::{DeclaredType, Value};

use super::{expect_tagged, not_claimed};

/// Scalars the IR carries natively; they map onto themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughHelper;

impl Helper for PassthroughHelper {
    fn type_name(&self) -> &'static str {
        "passthrough"
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(
            value,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Bytes(_)
        )
    }

    fn flatten(&self, value: &Value, _: &RootFlattener) -> Result<Ir> {
        Ok(match value {
            Value::Bool(b) => Ir::Bool(*b),
            Value::Int(i) => Ir::Int(*i),
            Value::Float(f) => Ir::Float(*f),
            Value::Str(s) => Ir::Str(s.clone()),
            Value::Bytes(b) => Ir::Bytes(b.clone()),
            other => return Err(not_claimed(other)),
        })
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        matches!(
            ir,
            Ir::Null | Ir::Bool(_) | Ir::Int(_) | Ir::Float(_) | Ir::Str(_) | Ir::Bytes(_)
        )
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        Ok(match ir {
            Ir::Null => Value::Null,
            Ir::Bool(b) => Value::Bool(*b),
            Ir::Int(i) => Value::Int(*i),
            Ir::Float(f) => Value::Float(*f),
            Ir::Str(s) => Value::Str(s.clone()),
            Ir::Bytes(b) => Value::Bytes(b.clone()),
            other => {
                return Err(FlattenError::UnsupportedRepresentation { description: other.describe() });
            }
        })
    }
}

pub const TYPED_NONE: &str = "TypedNone";
const DECLARED_TYPE: &str = "declaredType";
const UNTYPED: &str = "null";

/// Nulls, typed or not. The declared type is advisory: one this side cannot
/// resolve degrades to a plain null.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedNullHelper;

impl Helper for TypedNullHelper {
    fn type_name(&self) -> &'static str {
        TYPED_NONE
    }

    fn can_flatten(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn flatten(&self, value: &Value, _: &RootFlattener) -> Result<Ir> {
        let declared = match value {
            Value::Null => UNTYPED,
            Value::TypedNull(declared) => declared.name(),
            other => return Err(not_claimed(other)),
        };
        Ok(TaggedMap::new(TYPED_NONE).with(DECLARED_TYPE, Ir::Str(declared.to_string())).into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.is_tagged(TYPED_NONE)
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        let map = expect_tagged(ir, TYPED_NONE)?;
        let declared = match map.get(DECLARED_TYPE) {
            None | Some(Ir::Null) => return Ok(Value::Null),
            Some(Ir::Str(name)) if name == UNTYPED => return Ok(Value::Null),
            Some(Ir::Str(name)) => name,
            Some(other) => return Err(map.wrong_kind(DECLARED_TYPE, "string", other)),
        };
        match DeclaredType::resolve(declared) {
            known @ DeclaredType::Known(_) => Ok(Value::TypedNull(known)),
            DeclaredType::Foreign(name) => {
                tracing::debug!(declared = %name, "unresolvable declared type; using plain null");
                Ok(Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlattenerConfig;
    use crate::flattener::standard;
    use crate::value::ValueKind;

    fn flattener() -> RootFlattener {
        standard(&FlattenerConfig::default())
    }

    #[test]
    fn scalars_flatten_to_themselves() {
        let f = flattener();
        for (value, ir) in [
            (Value::Bool(true), Ir::Bool(true)),
            (Value::Int(-7), Ir::Int(-7)),
            (Value::Float(0.25), Ir::Float(0.25)),
            (Value::from("peak"), Ir::Str("peak".into())),
            (Value::Bytes(vec![0, 255]), Ir::Bytes(vec![0, 255])),
        ] {
            assert_eq!(f.flatten(&value).unwrap(), ir);
            assert_eq!(f.unflatten(&ir).unwrap(), value);
        }
    }

    #[test]
    fn bare_null_unflattens_to_null() {
        assert_eq!(flattener().unflatten(&Ir::Null).unwrap(), Value::Null);
    }

    #[test]
    fn plain_null_is_tagged_untyped() {
        let ir = flattener().flatten(&Value::Null).unwrap();
        let map = ir.as_tagged().unwrap();
        assert_eq!(map.type_key(), TYPED_NONE);
        assert_eq!(map.get(DECLARED_TYPE), Some(&Ir::Str("null".into())));
        assert_eq!(flattener().unflatten(&ir).unwrap(), Value::Null);
    }

    #[test]
    fn known_declared_type_survives() {
        let f = flattener();
        let value = Value::TypedNull(DeclaredType::Known(ValueKind::SectorRoi));
        assert_eq!(f.unflatten(&f.flatten(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn foreign_declared_type_degrades_to_null() {
        let f = flattener();
        let value = Value::TypedNull(DeclaredType::Foreign("Foo".into()));
        let ir = f.flatten(&value).unwrap();
        assert_eq!(ir.as_tagged().unwrap().get(DECLARED_TYPE), Some(&Ir::Str("Foo".into())));
        assert_eq!(f.unflatten(&ir).unwrap(), Value::Null);
    }

    #[test]
    fn declared_type_must_be_a_string() {
        let ir: Ir = TaggedMap::new(TYPED_NONE).with(DECLARED_TYPE, Ir::Int(3)).into();
        assert!(matches!(
            flattener().unflatten(&ir),
            Err(FlattenError::MalformedRepresentation { .. })
        ));
    }
}
