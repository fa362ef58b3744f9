//! The GUI state map ("GuiBean").
//!
//! Unlike every other helper this one is lenient on the way in: a slot value
//! of the wrong type is upgraded when a rule applies and otherwise kept as is,
//! with a warning.
use uuid::Uuid;

use crate::error::Result;
use crate::flattener::{Helper, RootFlattener};
use crate::ir::{Ir, TaggedMap};
use crate::value::{
    Enumerant, GuiParameter, PlotMode, RoiList, SlotType, StateMap, TypedArray, Value, ValueKind,
};

use super::{expect_tagged, not_claimed};

pub const GUI_BEAN: &str = "GuiBean";

#[derive(Debug, Clone, Copy, Default)]
pub struct StateMapHelper;

impl Helper for StateMapHelper {
    fn type_name(&self) -> &'static str {
        GUI_BEAN
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::StateMap(_))
    }

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir> {
        let Value::StateMap(state) = value else {
            return Err(not_claimed(value));
        };
        let mut map = TaggedMap::new(GUI_BEAN);
        for (slot, value) in state.iter() {
            if slot.slot_type() == SlotType::Unsupported {
                tracing::debug!(%slot, "skipping slot that cannot cross the boundary");
                continue;
            }
            map.insert(slot.name(), flattener.flatten(value)?);
        }
        Ok(map.into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.is_tagged(GUI_BEAN)
    }

    fn unflatten(&self, ir: &Ir, flattener: &RootFlattener) -> Result<Value> {
        let map = expect_tagged(ir, GUI_BEAN)?;
        let mut state = StateMap::new();
        for (name, field) in map.payload() {
            let Some(slot) = GuiParameter::from_name(name) else {
                tracing::debug!(field = name, "ignoring unknown state slot");
                continue;
            };
            let value = flattener.unflatten(field)?;
            state.insert(slot, conform(slot, value));
        }
        Ok(Value::StateMap(state))
    }
}

/// Bring `value` to the slot's declared type if possible.
fn conform(slot: GuiParameter, value: Value) -> Value {
    let expected = slot.slot_type();
    if expected.accepts(&value) {
        return value;
    }
    match upgrade(expected, &value) {
        Some(upgraded) => upgraded,
        None => {
            tracing::warn!(
                %slot,
                expected = expected.describe(),
                found = %value.type_name(),
                "state slot holds an unexpected type; keeping it as is"
            );
            value
        }
    }
}

fn upgrade(expected: SlotType, value: &Value) -> Option<Value> {
    match expected {
        SlotType::Exactly(ValueKind::List) => Some(Value::List(value.as_sequence()?.into_owned())),
        SlotType::Exactly(ValueKind::IntArray) => value
            .as_sequence()?
            .iter()
            .map(Value::as_i64)
            .collect::<Option<Vec<_>>>()
            .map(|xs| Value::Array(TypedArray::Int(xs))),
        SlotType::AnyRoiList => {
            let rois = value
                .as_sequence()?
                .iter()
                .map(|v| match v {
                    Value::Roi(roi) => Some(*roi),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            RoiList::from_rois(rois).map(Value::RoiList)
        }
        SlotType::Exactly(ValueKind::PlotMode) => PlotMode::from_name(value.as_str()?).map(Value::PlotMode),
        SlotType::Exactly(ValueKind::Uuid) => Uuid::parse_str(value.as_str()?).ok().map(Value::Uuid),
        _ => None,
    }
}
