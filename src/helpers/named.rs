//! Values that cross the boundary as a single string.
use std::marker::PhantomData;

use uuid::Uuid;

use crate::error::{FlattenError, Result};
use crate::flattener::{Helper, RootFlattener};
use crate::ir::{Ir, TaggedMap};
use crate::value::{Enumerant, Value};

use super::{expect_tagged, not_claimed};

const CONTENT: &str = "content";

/// Enumeration-like constants, looked up by name in the category's table.
pub struct NameKeyedHelper<E>(PhantomData<fn() -> E>);

impl<E: Enumerant> NameKeyedHelper<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Enumerant> Default for NameKeyedHelper<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Enumerant> Helper for NameKeyedHelper<E> {
    fn type_name(&self) -> &'static str {
        E::CATEGORY
    }

    fn can_flatten(&self, value: &Value) -> bool {
        E::from_value(value).is_some()
    }

    fn flatten(&self, value: &Value, _: &RootFlattener) -> Result<Ir> {
        let constant = E::from_value(value).ok_or_else(|| not_claimed(value))?;
        Ok(TaggedMap::new(E::CATEGORY)
            .with(CONTENT, Ir::Str(constant.name().to_string()))
            .into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.is_tagged(E::CATEGORY)
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        let name = expect_tagged(ir, E::CATEGORY)?.require_str(CONTENT)?;
        E::from_name(name)
            .map(E::into_value)
            .ok_or_else(|| FlattenError::UnknownEnumerant {
                category: E::CATEGORY,
                name: name.to_string(),
            })
    }
}

pub const UUID: &str = "uuid";

/// Identifiers, carried in their hyphenated text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierHelper;

impl Helper for IdentifierHelper {
    fn type_name(&self) -> &'static str {
        UUID
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::Uuid(_))
    }

    fn flatten(&self, value: &Value, _: &RootFlattener) -> Result<Ir> {
        let Value::Uuid(id) = value else {
            return Err(not_claimed(value));
        };
        Ok(TaggedMap::new(UUID)
            .with(CONTENT, Ir::Str(id.hyphenated().to_string()))
            .into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.is_tagged(UUID)
    }

    fn unflatten(&self, ir: &Ir, _: &RootFlattener) -> Result<Value> {
        let text = expect_tagged(ir, UUID)?.require_str(CONTENT)?;
        Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|e| FlattenError::malformed(UUID, format!("`{text}`: {e}")))
    }
}
