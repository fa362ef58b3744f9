//! GUI state map: values keyed by [`GuiParameter`] slots.
use indexmap::IndexMap;

use super::{GuiParameter, Value, ValueKind};

/// What a slot is declared to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Exactly(ValueKind),
    AnyRoi,
    AnyRoiList,
    /// Never sent across the boundary.
    Unsupported,
}

impl SlotType {
    /// Nulls fit every slot.
    pub fn accepts(self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            // narrowed arrays report `List` as their kind but are not lists
            SlotType::Exactly(ValueKind::List) => matches!(value, Value::List(_)),
            SlotType::Exactly(kind) => value.kind() == Some(kind),
            SlotType::AnyRoi => matches!(value, Value::Roi(_)),
            SlotType::AnyRoiList => matches!(value, Value::RoiList(_)),
            SlotType::Unsupported => false,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            SlotType::Exactly(kind) => kind.name(),
            SlotType::AnyRoi => "ROI",
            SlotType::AnyRoiList => "ROI list",
            SlotType::Unsupported => "unsupported",
        }
    }
}

impl GuiParameter {
    pub fn slot_type(self) -> SlotType {
        use GuiParameter::*;
        match self {
            PlotMode => SlotType::Exactly(ValueKind::PlotMode),
            Title | PlotOperation | FileName => SlotType::Exactly(ValueKind::Str),
            Roi => SlotType::AnyRoi,
            RoiList => SlotType::AnyRoiList,
            PlotId => SlotType::Exactly(ValueKind::Uuid),
            FileList => SlotType::Exactly(ValueKind::List),
            QuietUpdate => SlotType::Exactly(ValueKind::Bool),
            ImageGridXPos | ImageGridYPos => SlotType::Exactly(ValueKind::Int),
            ImageGridSize => SlotType::Exactly(ValueKind::IntArray),
            Metadata => SlotType::Exactly(ValueKind::Map),
            AxisData => SlotType::Exactly(ValueKind::Dataset),
            FileOperation | Masking => SlotType::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateMap {
    slots: IndexMap<GuiParameter, Value>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the value whatever its type; mismatches are only reported
    /// when crossing the boundary.
    pub fn insert(&mut self, slot: GuiParameter, value: impl Into<Value>) -> Option<Value> {
        self.slots.insert(slot, value.into())
    }

    pub fn with(mut self, slot: GuiParameter, value: impl Into<Value>) -> Self {
        self.insert(slot, value);
        self
    }

    pub fn get(&self, slot: GuiParameter) -> Option<&Value> {
        self.slots.get(&slot)
    }

    pub fn remove(&mut self, slot: GuiParameter) -> Option<Value> {
        self.slots.shift_remove(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GuiParameter, &Value)> {
        self.slots.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
