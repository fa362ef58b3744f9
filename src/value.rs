//! The closed catalogue of values the codec knows how to carry.
//!
//! Every semantic category handled by a helper is one variant of [`Value`].
//! `ValueKind` names the exact runtime type of a non-null value; `Capability`
//! names the two broader families the array specialization pass knows about.
pub mod dataset;
pub mod described;
pub mod named;
pub mod roi;
pub mod state;

use std::borrow::Cow;
use std::fmt;

use ordered_float::OrderedFloat;
use uuid::Uuid;

pub use dataset::{Dataset, NumericData};
pub use described::{Described, Histogram, SelfFlattening};
pub use named::{Enumerant, GuiParameter, PlotMode};
pub use roi::{
    EllipticalRoi, LinearRoi, RectangularRoi, Roi, RoiBase, RoiKind, RoiList, SectorRoi,
};
pub use state::{SlotType, StateMap};

// ------------------------------- Value ----------------------------------- //

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    /// Absent value that remembers what it would have been.
    TypedNull(DeclaredType),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Heterogeneous ordered sequence.
    List(Vec<Value>),
    /// Narrowed sequence produced by specialization (or built directly).
    Array(TypedArray),
    Map(ValueMap),
    Roi(Roi),
    RoiList(RoiList),
    GuiParameter(GuiParameter),
    PlotMode(PlotMode),
    Uuid(Uuid),
    Dataset(Dataset),
    StateMap(StateMap),
    Described(Described),
}

#[derive(Debug, Clone)]
pub enum TypedArray {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    /// Every non-null item has exactly `kind`.
    Homogeneous { kind: ValueKind, items: Vec<Value> },
    /// Every non-null item shares `capability`.
    Common { capability: Capability, items: Vec<Value> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    NumericArray,
    RegionOfInterest,
}

/// Declared type of a typed null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Known(ValueKind),
    /// A type only the peer knows about.
    Foreign(String),
}

impl DeclaredType {
    pub fn name(&self) -> &str {
        match self {
            DeclaredType::Known(kind) => kind.name(),
            DeclaredType::Foreign(name) => name,
        }
    }

    pub fn resolve(name: &str) -> Self {
        match ValueKind::from_name(name) {
            Some(kind) => DeclaredType::Known(kind),
            None => DeclaredType::Foreign(name.to_string()),
        }
    }
}

// ------------------------------ ValueKind -------------------------------- //

macro_rules! value_kinds {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ValueKind { $($variant),* }

        impl ValueKind {
            pub const ALL: &'static [ValueKind] = &[$(ValueKind::$variant),*];

            pub fn name(self) -> &'static str {
                match self { $(ValueKind::$variant => $name),* }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name { $($name => Some(ValueKind::$variant),)* _ => None }
            }
        }
    };
}

value_kinds! {
    Bool => "bool",
    Int => "int",
    Float => "float",
    Str => "str",
    Bytes => "bytes",
    List => "list",
    BoolArray => "bool[]",
    IntArray => "int[]",
    FloatArray => "float[]",
    Map => "Map",
    RoiBase => "ROIBase",
    PointRoi => "PointROI",
    LinearRoi => "LinearROI",
    RectangularRoi => "RectangularROI",
    EllipticalRoi => "EllipticalROI",
    SectorRoi => "SectorROI",
    PointRoiList => "PointROIList",
    LinearRoiList => "LinearROIList",
    RectangularRoiList => "RectangularROIList",
    EllipticalRoiList => "EllipticalROIList",
    SectorRoiList => "SectorROIList",
    GuiParameter => "GuiParameter",
    PlotMode => "PlotMode",
    Uuid => "uuid",
    Dataset => "Dataset",
    StateMap => "GuiBean",
    Described => "Described",
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ------------------------------- ValueMap -------------------------------- //

/// Map with arbitrary value keys, kept in insertion order.
///
/// Keys are compared with content equality, so lookups are linear.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing (and returning) the value of an equal key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k.into(), v.into());
        }
        map
    }
}

// ------------------------------ Inspection ------------------------------- //

impl Value {
    /// Exact runtime type; `None` for both kinds of null.
    pub fn kind(&self) -> Option<ValueKind> {
        let kind = match self {
            Value::Null | Value::TypedNull(_) => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::List(_) => ValueKind::List,
            Value::Array(TypedArray::Bool(_)) => ValueKind::BoolArray,
            Value::Array(TypedArray::Int(_)) => ValueKind::IntArray,
            Value::Array(TypedArray::Float(_)) => ValueKind::FloatArray,
            Value::Array(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Roi(roi) => roi.kind().value_kind(),
            Value::RoiList(list) => list.kind().list_value_kind(),
            Value::GuiParameter(_) => ValueKind::GuiParameter,
            Value::PlotMode(_) => ValueKind::PlotMode,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Dataset(_) => ValueKind::Dataset,
            Value::StateMap(_) => ValueKind::StateMap,
            Value::Described(_) => ValueKind::Described,
        };
        Some(kind)
    }

    /// The broader family used when exact types disagree.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Value::Dataset(_)
            | Value::Array(TypedArray::Int(_))
            | Value::Array(TypedArray::Float(_)) => Some(Capability::NumericArray),
            Value::Roi(_) => Some(Capability::RegionOfInterest),
            _ => None,
        }
    }

    /// Name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::TypedNull(declared) => format!("null<{}>", declared.name()),
            Value::Described(described) => described.type_name().to_string(),
            other => other.kind().map(ValueKind::name).unwrap_or("?").to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::TypedNull(_))
    }

    /// Elements of any sequence form. Packed arrays are boxed on the fly.
    pub fn as_sequence(&self) -> Option<Cow<'_, [Value]>> {
        match self {
            Value::List(items)
            | Value::Array(TypedArray::Homogeneous { items, .. })
            | Value::Array(TypedArray::Common { items, .. }) => Some(Cow::Borrowed(items)),
            Value::Array(TypedArray::Bool(xs)) => {
                Some(Cow::Owned(xs.iter().copied().map(Value::Bool).collect()))
            }
            Value::Array(TypedArray::Int(xs)) => {
                Some(Cow::Owned(xs.iter().copied().map(Value::Int).collect()))
            }
            Value::Array(TypedArray::Float(xs)) => {
                Some(Cow::Owned(xs.iter().copied().map(Value::Float).collect()))
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Ints widen to floats; the peer is free to send either.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            Value::Array(TypedArray::Float(xs)) => Some(xs.clone()),
            other => other.as_sequence()?.iter().map(Value::as_f64).collect(),
        }
    }
}

// ------------------------------- Equality -------------------------------- //

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (TypedNull(a), TypedNull(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Roi(a), Roi(b)) => a == b,
            (RoiList(a), RoiList(b)) => a == b,
            (GuiParameter(a), GuiParameter(b)) => a == b,
            (PlotMode(a), PlotMode(b)) => a == b,
            (Uuid(a), Uuid(b)) => a == b,
            (Dataset(a), Dataset(b)) => a == b,
            (StateMap(a), StateMap(b)) => a == b,
            (Described(a), Described(b)) => a == b,
            (a, b) => match (a.as_sequence(), b.as_sequence()) {
                (Some(xs), Some(ys)) => xs == ys,
                _ => false,
            },
        }
    }
}

// ----------------------------- Conversions ------------------------------- //

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<f64>> for Value {
    fn from(xs: Vec<f64>) -> Self {
        Value::Array(TypedArray::Float(xs))
    }
}

impl From<Vec<i64>> for Value {
    fn from(xs: Vec<i64>) -> Self {
        Value::Array(TypedArray::Int(xs))
    }
}

impl From<Vec<bool>> for Value {
    fn from(xs: Vec<bool>) -> Self {
        Value::Array(TypedArray::Bool(xs))
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::List(xs)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<Roi> for Value {
    fn from(roi: Roi) -> Self {
        Value::Roi(roi)
    }
}

impl From<RoiList> for Value {
    fn from(list: RoiList) -> Self {
        Value::RoiList(list)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Uuid(id)
    }
}

impl From<Dataset> for Value {
    fn from(ds: Dataset) -> Self {
        Value::Dataset(ds)
    }
}

impl From<StateMap> for Value {
    fn from(state: StateMap) -> Self {
        Value::StateMap(state)
    }
}

impl From<GuiParameter> for Value {
    fn from(p: GuiParameter) -> Self {
        Value::GuiParameter(p)
    }
}

impl From<PlotMode> for Value {
    fn from(m: PlotMode) -> Self {
        Value::PlotMode(m)
    }
}

impl From<Described> for Value {
    fn from(d: Described) -> Self {
        Value::Described(d)
    }
}

// ------------------------------- Tests ------------------------------------ //
