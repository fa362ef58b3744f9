// The intermediate representation exchanged with the peer process.
//
// Closed on purpose: the transport only ever has to encode these eight shapes.

use indexmap::IndexMap;

use crate::error::{FlattenError, Result};

/// Reserved field naming the helper that produced a tagged map.
pub const TYPE_KEY: &str = "type_key";

#[derive(Debug, Clone, PartialEq)]
pub enum Ir {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<Ir>),          // heterogeneous by construction
    TaggedMap(TaggedMap),    // every composite value ends up here
}

/// A string-keyed map that always carries a [`TYPE_KEY`] entry.
///
/// Field order is kept for readable output but ignored by equality.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedMap {
    fields: IndexMap<String, Ir>,
}

impl TaggedMap {
    pub fn new(type_key: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(TYPE_KEY.to_string(), Ir::Str(type_key.into()));
        Self { fields }
    }

    /// Rebuild from raw fields (e.g. a decoded JSON object).
    pub fn from_fields(fields: IndexMap<String, Ir>) -> Result<Self> {
        match fields.get(TYPE_KEY) {
            Some(Ir::Str(_)) => Ok(Self { fields }),
            Some(other) => Err(FlattenError::malformed(
                "<untagged>",
                format!("`{TYPE_KEY}` must be a string, found {}", other.kind_name()),
            )),
            None => Err(FlattenError::malformed("<untagged>", format!("missing `{TYPE_KEY}`"))),
        }
    }

    pub fn type_key(&self) -> &str {
        match self.fields.get(TYPE_KEY) {
            Some(Ir::Str(key)) => key,
            _ => "",
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: Ir) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field. The type tag itself cannot be overwritten.
    pub fn insert(&mut self, name: impl Into<String>, value: Ir) {
        let name = name.into();
        if name == TYPE_KEY {
            return;
        }
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Ir> {
        self.fields.get(name)
    }

    /// Like [`TaggedMap::get`] but a missing field is a malformed representation.
    pub fn require(&self, name: &str) -> Result<&Ir> {
        self.fields
            .get(name)
            .ok_or_else(|| FlattenError::malformed(self.type_key(), format!("missing field `{name}`")))
    }

    pub fn require_str(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            Ir::Str(s) => Ok(s),
            other => Err(self.wrong_kind(name, "string", other)),
        }
    }

    pub fn require_bool(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            Ir::Bool(b) => Ok(*b),
            other => Err(self.wrong_kind(name, "bool", other)),
        }
    }

    pub fn require_array(&self, name: &str) -> Result<&[Ir]> {
        match self.require(name)? {
            Ir::Array(xs) => Ok(xs),
            other => Err(self.wrong_kind(name, "array", other)),
        }
    }

    pub fn wrong_kind(&self, field: &str, expected: &str, found: &Ir) -> FlattenError {
        FlattenError::malformed(
            self.type_key(),
            format!("field `{field}` should be {expected}, found {}", found.kind_name()),
        )
    }

    /// All fields, the type tag included.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Ir)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fields other than the type tag.
    pub fn payload(&self) -> impl Iterator<Item = (&str, &Ir)> {
        self.fields().filter(|(k, _)| *k != TYPE_KEY)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Ir {
    /// The tag of a tagged map, `None` for every other shape.
    pub fn type_key(&self) -> Option<&str> {
        match self {
            Ir::TaggedMap(map) => Some(map.type_key()),
            _ => None,
        }
    }

    pub fn is_tagged(&self, type_key: &str) -> bool {
        self.type_key() == Some(type_key)
    }

    pub fn as_tagged(&self) -> Option<&TaggedMap> {
        match self {
            Ir::TaggedMap(map) => Some(map),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Ir::Null => "null",
            Ir::Bool(_) => "bool",
            Ir::Int(_) => "int",
            Ir::Float(_) => "float",
            Ir::Str(_) => "string",
            Ir::Bytes(_) => "bytes",
            Ir::Array(_) => "array",
            Ir::TaggedMap(_) => "tagged map",
        }
    }

    /// Short human description used in dispatch errors.
    pub fn describe(&self) -> String {
        match self {
            Ir::TaggedMap(map) => format!("tagged map `{}`", map.type_key()),
            other => other.kind_name().to_string(),
        }
    }
}

impl From<TaggedMap> for Ir {
    fn from(map: TaggedMap) -> Self {
        Ir::TaggedMap(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_always_present_and_protected() {
        let map = TaggedMap::new("Map").with(TYPE_KEY, Ir::Int(3)).with("keys", Ir::Array(vec![]));
        assert_eq!(map.type_key(), "Map");
        assert_eq!(map.get(TYPE_KEY), Some(&Ir::Str("Map".into())));
        assert_eq!(map.payload().count(), 1);
    }

    #[test]
    fn field_order_does_not_affect_equality() {
        let a = TaggedMap::new("T").with("x", Ir::Int(1)).with("y", Ir::Int(2));
        let b = TaggedMap::new("T").with("y", Ir::Int(2)).with("x", Ir::Int(1));
        assert_eq!(a, b);
    }

    #[test]
    fn from_fields_requires_string_tag() {
        let mut fields = IndexMap::new();
        fields.insert("x".to_string(), Ir::Null);
        assert!(matches!(
            TaggedMap::from_fields(fields.clone()),
            Err(FlattenError::MalformedRepresentation { .. })
        ));
        fields.insert(TYPE_KEY.to_string(), Ir::Str("X".into()));
        assert_eq!(TaggedMap::from_fields(fields).unwrap().type_key(), "X");
    }

    #[test]
    fn require_reports_missing_field() {
        let map = TaggedMap::new("LinearROI");
        let err = map.require("len").unwrap_err();
        assert!(err.to_string().contains("len"));
        assert!(err.to_string().contains("LinearROI"));
    }
}
