//! Serde encoding of the IR, used by the CLI with JSON.
//!
//! Tagged maps become objects with `type_key` first. Two tags are reserved at
//! this layer for shapes JSON cannot express: `bytes` and non-finite `float`.
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{FlattenError, Result};
use crate::ir::{Ir, TYPE_KEY, TaggedMap};

const BYTES_TAG: &str = "bytes";
const FLOAT_TAG: &str = "float";
const CONTENT: &str = "content";

// ------------------------------ serialize -------------------------------- //

impl Serialize for Ir {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Ir::Null => serializer.serialize_unit(),
            Ir::Bool(b) => serializer.serialize_bool(*b),
            Ir::Int(i) => serializer.serialize_i64(*i),
            Ir::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Ir::Float(f) => {
                let text = if f.is_nan() {
                    "NaN"
                } else if *f > 0.0 {
                    "inf"
                } else {
                    "-inf"
                };
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(TYPE_KEY, FLOAT_TAG)?;
                map.serialize_entry(CONTENT, text)?;
                map.end()
            }
            Ir::Str(s) => serializer.serialize_str(s),
            Ir::Bytes(bytes) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(TYPE_KEY, BYTES_TAG)?;
                map.serialize_entry(CONTENT, bytes)?;
                map.end()
            }
            Ir::Array(xs) => serializer.collect_seq(xs),
            Ir::TaggedMap(tagged) => tagged.serialize(serializer),
        }
    }
}

impl Serialize for TaggedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        map.serialize_entry(TYPE_KEY, self.type_key())?;
        for (name, value) in self.payload() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ----------------------------- deserialize ------------------------------- //

impl<'de> Deserialize<'de> for Ir {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(IrVisitor)
    }
}

struct IrVisitor;

impl<'de> Visitor<'de> for IrVisitor {
    type Value = Ir;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("null, bool, number, string, array, or an object with a string `type_key`")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Ir, E> {
        Ok(Ir::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Ir, E> {
        Ok(Ir::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Ir, D::Error> {
        Ir::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Ir, E> {
        Ok(Ir::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> std::result::Result<Ir, E> {
        Ok(Ir::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> std::result::Result<Ir, E> {
        Ok(i64::try_from(u).map(Ir::Int).unwrap_or(Ir::Float(u as f64)))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> std::result::Result<Ir, E> {
        Ok(Ir::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Ir, E> {
        Ok(Ir::Str(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Ir, E> {
        Ok(Ir::Str(s))
    }

    fn visit_bytes<E: de::Error>(self, b: &[u8]) -> std::result::Result<Ir, E> {
        Ok(Ir::Bytes(b.to_vec()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Ir, A::Error> {
        let mut xs = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(x) = seq.next_element()? {
            xs.push(x);
        }
        Ok(Ir::Array(xs))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Ir, A::Error> {
        let mut fields = IndexMap::<String, Ir>::new();
        while let Some((key, value)) = access.next_entry::<String, Ir>()? {
            fields.insert(key, value);
        }
        match fields.get(TYPE_KEY) {
            Some(Ir::Str(tag)) if tag == BYTES_TAG => decode_bytes(&fields).map_err(de::Error::custom),
            Some(Ir::Str(tag)) if tag == FLOAT_TAG => decode_float(&fields).map_err(de::Error::custom),
            _ => TaggedMap::from_fields(fields).map(Ir::TaggedMap).map_err(de::Error::custom),
        }
    }
}

fn decode_bytes(fields: &IndexMap<String, Ir>) -> std::result::Result<Ir, String> {
    let Some(Ir::Array(xs)) = fields.get(CONTENT) else {
        return Err("`bytes` needs an array `content`".to_string());
    };
    xs.iter()
        .map(|x| match x {
            Ir::Int(i) => u8::try_from(*i).map_err(|_| format!("byte out of range: {i}")),
            other => Err(format!("byte must be an int, found {}", other.kind_name())),
        })
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map(Ir::Bytes)
}

fn decode_float(fields: &IndexMap<String, Ir>) -> std::result::Result<Ir, String> {
    match fields.get(CONTENT) {
        Some(Ir::Str(s)) if s == "NaN" => Ok(Ir::Float(f64::NAN)),
        Some(Ir::Str(s)) if s == "inf" => Ok(Ir::Float(f64::INFINITY)),
        Some(Ir::Str(s)) if s == "-inf" => Ok(Ir::Float(f64::NEG_INFINITY)),
        _ => Err("`float` content must be \"NaN\", \"inf\" or \"-inf\"".to_string()),
    }
}

// ------------------------------ entry points ----------------------------- //

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        FlattenError::Wire(format!("at JSON path {path} → {}", err.into_inner()))
    })
}

/// Decode one IR document from JSON text.
pub fn decode(src: &str) -> Result<Ir> {
    from_str_with_path(src)
}

/// Encode one IR document as pretty JSON.
pub fn encode_pretty(ir: &Ir) -> Result<String> {
    serde_json::to_string_pretty(ir).map_err(|e| FlattenError::Wire(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tagged_map_writes_tag_first() {
        let ir: Ir = TaggedMap::new("PointROI")
            .with("spt", Ir::Array(vec![Ir::Float(1.0), Ir::Float(2.0)]))
            .with("plot", Ir::Bool(true))
            .into();
        let text = serde_json::to_string(&ir).unwrap();
        assert!(text.starts_with(r#"{"type_key":"PointROI""#), "{text}");
        assert_eq!(decode(&text).unwrap(), ir);
    }

    #[test]
    fn floats_stay_floats() {
        let ir = Ir::Array(vec![Ir::Float(1.0), Ir::Int(1), Ir::Float(-0.5)]);
        let text = serde_json::to_string(&ir).unwrap();
        assert_eq!(decode(&text).unwrap(), ir);
    }

    #[test]
    fn reserved_shapes_survive_json() {
        let ir = Ir::Array(vec![
            Ir::Bytes(vec![0, 7, 255]),
            Ir::Float(f64::INFINITY),
            Ir::Float(f64::NEG_INFINITY),
            Ir::Null,
        ]);
        let text = serde_json::to_string(&ir).unwrap();
        assert_eq!(decode(&text).unwrap(), ir);

        let nan = decode(&serde_json::to_string(&Ir::Float(f64::NAN)).unwrap()).unwrap();
        assert!(matches!(nan, Ir::Float(f) if f.is_nan()));
    }

    #[test]
    fn untagged_object_reports_its_path() {
        let doc = json!({"type_key": "Map", "keys": [{"x": 1}], "values": [1]}).to_string();
        let err = decode(&doc).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, FlattenError::Wire(_)));
        assert!(msg.contains("keys"), "{msg}");
        assert!(msg.contains("type_key"), "{msg}");
    }

    #[test]
    fn bad_byte_is_rejected() {
        let doc = json!({"type_key": "bytes", "content": [256]}).to_string();
        assert!(decode(&doc).is_err());
    }

    #[test]
    fn huge_unsigned_degrades_to_float() {
        assert_eq!(decode("18446744073709551615").unwrap(), Ir::Float(u64::MAX as f64));
    }
}
