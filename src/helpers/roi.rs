//! Region-of-interest shapes and typed shape lists.
//!
//! Every shape writes the shared base fields (`spt`, `plot`) and then its own;
//! the concrete tag selects the variant on the way back. All fields of a
//! variant are required.
use crate::error::{FlattenError, Result};
use crate::flattener::{Helper, RootFlattener};
use crate::ir::{Ir, TaggedMap};
use crate::value::{
    EllipticalRoi, LinearRoi, RectangularRoi, Roi, RoiBase, RoiKind, RoiList, SectorRoi, Value,
};

use super::not_claimed;

const POINT: &str = "spt";
const PLOT: &str = "plot";
const CONTENT: &str = "content";

// ----------------------------- field access ------------------------------ //

fn flatten_pair(pair: [f64; 2], flattener: &RootFlattener) -> Result<Ir> {
    flattener.flatten(&Value::from(pair.to_vec()))
}

fn field(map: &TaggedMap, name: &str, flattener: &RootFlattener) -> Result<Value> {
    flattener.unflatten(map.require(name)?)
}

fn mismatch(map: &TaggedMap, name: &str, expected: &str, found: &Value) -> FlattenError {
    FlattenError::malformed(
        map.type_key(),
        format!("field `{name}` should be {expected}, found {}", found.type_name()),
    )
}

fn field_f64(map: &TaggedMap, name: &str, flattener: &RootFlattener) -> Result<f64> {
    let value = field(map, name, flattener)?;
    value.as_f64().ok_or_else(|| mismatch(map, name, "a number", &value))
}

fn field_i64(map: &TaggedMap, name: &str, flattener: &RootFlattener) -> Result<i64> {
    let value = field(map, name, flattener)?;
    value.as_i64().ok_or_else(|| mismatch(map, name, "an integer", &value))
}

fn field_bool(map: &TaggedMap, name: &str, flattener: &RootFlattener) -> Result<bool> {
    let value = field(map, name, flattener)?;
    value.as_bool().ok_or_else(|| mismatch(map, name, "a bool", &value))
}

fn field_pair(map: &TaggedMap, name: &str, flattener: &RootFlattener) -> Result<[f64; 2]> {
    let value = field(map, name, flattener)?;
    match value.as_f64s().as_deref() {
        Some(&[a, b]) => Ok([a, b]),
        _ => Err(mismatch(map, name, "a pair of numbers", &value)),
    }
}

// ------------------------------ base shape ------------------------------- //

fn flatten_base(kind: RoiKind, base: &RoiBase, flattener: &RootFlattener) -> Result<TaggedMap> {
    Ok(TaggedMap::new(kind.type_key())
        .with(POINT, flatten_pair(base.point, flattener)?)
        .with(PLOT, Ir::Bool(base.plot)))
}

fn unflatten_base(map: &TaggedMap, flattener: &RootFlattener) -> Result<RoiBase> {
    Ok(RoiBase {
        point: field_pair(map, POINT, flattener)?,
        plot: field_bool(map, PLOT, flattener)?,
    })
}

/// Every shape of the family, the abstract base included.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoiHelper;

impl Helper for RoiHelper {
    fn type_name(&self) -> &'static str {
        "ROI"
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::Roi(_))
    }

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir> {
        let Value::Roi(roi) = value else {
            return Err(not_claimed(value));
        };
        let map = flatten_base(roi.kind(), roi.base(), flattener)?;
        let map = match roi {
            Roi::Base(_) | Roi::Point(_) => map,
            Roi::Linear(roi) => map
                .with("len", Ir::Float(roi.length))
                .with("ang", Ir::Float(roi.angle))
                .with("crossHair", Ir::Bool(roi.cross_hair)),
            Roi::Rectangular(roi) => map
                .with("len", flatten_pair(roi.lengths, flattener)?)
                .with("angle", Ir::Float(roi.angle))
                .with("clippingCompensation", Ir::Bool(roi.clipping_compensation)),
            Roi::Elliptical(roi) => map
                .with("semiaxes", flatten_pair(roi.semi_axes, flattener)?)
                .with("angle", Ir::Float(roi.angle)),
            Roi::Sector(roi) => map
                .with("radii", flatten_pair(roi.radii, flattener)?)
                .with("angles", flatten_pair(roi.angles, flattener)?)
                .with("clippingCompensation", Ir::Bool(roi.clipping_compensation))
                .with("symmetry", Ir::Int(roi.symmetry))
                .with("combineSymmetry", Ir::Bool(roi.combine_symmetry))
                .with("averageArea", Ir::Bool(roi.average_area)),
        };
        Ok(map.into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.type_key().and_then(RoiKind::from_type_key).is_some()
    }

    fn unflatten(&self, ir: &Ir, f: &RootFlattener) -> Result<Value> {
        let Some((map, kind)) = ir
            .as_tagged()
            .and_then(|map| Some((map, RoiKind::from_type_key(map.type_key())?)))
        else {
            return Err(FlattenError::UnsupportedRepresentation { description: ir.describe() });
        };
        let base = unflatten_base(map, f)?;
        let roi = match kind {
            RoiKind::Base => Roi::Base(base),
            RoiKind::Point => Roi::Point(base),
            RoiKind::Linear => Roi::Linear(LinearRoi {
                base,
                length: field_f64(map, "len", f)?,
                angle: field_f64(map, "ang", f)?,
                cross_hair: field_bool(map, "crossHair", f)?,
            }),
            RoiKind::Rectangular => Roi::Rectangular(RectangularRoi {
                base,
                lengths: field_pair(map, "len", f)?,
                angle: field_f64(map, "angle", f)?,
                clipping_compensation: field_bool(map, "clippingCompensation", f)?,
            }),
            RoiKind::Elliptical => Roi::Elliptical(EllipticalRoi {
                base,
                semi_axes: field_pair(map, "semiaxes", f)?,
                angle: field_f64(map, "angle", f)?,
            }),
            RoiKind::Sector => Roi::Sector(SectorRoi {
                base,
                radii: field_pair(map, "radii", f)?,
                angles: field_pair(map, "angles", f)?,
                clipping_compensation: field_bool(map, "clippingCompensation", f)?,
                symmetry: field_i64(map, "symmetry", f)?,
                combine_symmetry: field_bool(map, "combineSymmetry", f)?,
                average_area: field_bool(map, "averageArea", f)?,
            }),
        };
        Ok(Value::Roi(roi))
    }
}

/// Strongly typed lists of one shape kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoiListHelper;

impl Helper for RoiListHelper {
    fn type_name(&self) -> &'static str {
        "ROIList"
    }

    fn can_flatten(&self, value: &Value) -> bool {
        matches!(value, Value::RoiList(_))
    }

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir> {
        let Value::RoiList(list) = value else {
            return Err(not_claimed(value));
        };
        let content = list
            .items()
            .iter()
            .map(|roi| flattener.flatten(&Value::Roi(*roi)))
            .collect::<Result<Vec<_>>>()?;
        Ok(TaggedMap::new(list.kind().list_type_key())
            .with(CONTENT, Ir::Array(content))
            .into())
    }

    fn can_unflatten(&self, ir: &Ir) -> bool {
        ir.type_key().and_then(RoiKind::from_list_type_key).is_some()
    }

    fn unflatten(&self, ir: &Ir, flattener: &RootFlattener) -> Result<Value> {
        let Some((map, kind)) = ir
            .as_tagged()
            .and_then(|map| Some((map, RoiKind::from_list_type_key(map.type_key())?)))
        else {
            return Err(FlattenError::UnsupportedRepresentation { description: ir.describe() });
        };
        let mut list = RoiList::new(kind);
        for (i, item) in map.require_array(CONTENT)?.iter().enumerate() {
            let pushed = match flattener.unflatten(item)? {
                Value::Roi(roi) => list.push(roi),
                _ => false,
            };
            if !pushed {
                return Err(FlattenError::malformed(
                    map.type_key(),
                    format!("element {i} is not a {}", kind.type_key()),
                ));
            }
        }
        Ok(Value::RoiList(list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlattenerConfig;
    use crate::flattener::standard;
    use pretty_assertions::assert_eq;

    fn flattener() -> RootFlattener {
        standard(&FlattenerConfig::default())
    }

    fn every_shape() -> Vec<Roi> {
        let base = RoiBase::new(12.5, -3.0).plotted(true);
        let mut line = LinearRoi::new(base, 10.0, 0.3);
        line.cross_hair = true;
        let mut rect = RectangularRoi::new(base, 4.0, 2.0, 0.1);
        rect.clipping_compensation = true;
        let mut sector = SectorRoi::new(base, [5.0, 20.0], [0.0, 1.57]);
        sector.symmetry = 4;
        sector.combine_symmetry = true;
        sector.average_area = true;
        vec![
            Roi::Base(base),
            Roi::Point(RoiBase::new(1.0, 2.0)),
            Roi::Linear(line),
            Roi::Rectangular(rect),
            Roi::Elliptical(EllipticalRoi::new(base, 3.0, 1.5, 0.7)),
            Roi::Sector(sector),
            Roi::Linear(LinearRoi::new(RoiBase::new(f64::NAN, 1.0), 2.0, f64::NAN)),
            Roi::Elliptical(EllipticalRoi::new(base, f64::INFINITY, f64::NAN, 0.0)),
        ]
    }

    #[test]
    fn every_shape_round_trips_under_its_own_tag() {
        let f = flattener();
        for roi in every_shape() {
            let ir = f.flatten(&Value::Roi(roi)).unwrap();
            assert_eq!(ir.type_key(), Some(roi.kind().type_key()));
            assert_eq!(f.unflatten(&ir).unwrap(), Value::Roi(roi));
        }
    }

    #[test]
    fn base_fields_are_shared() {
        let f = flattener();
        for roi in every_shape() {
            let ir = f.flatten(&Value::Roi(roi)).unwrap();
            let map = ir.as_tagged().unwrap();
            assert!(map.get(POINT).is_some());
            assert_eq!(map.get(PLOT), Some(&Ir::Bool(roi.base().plot)));
        }
    }

    #[test]
    fn missing_variant_field_is_malformed() {
        let f = flattener();
        let ir = f.flatten(&Value::Roi(every_shape()[5])).unwrap();
        let mut stripped = TaggedMap::new("SectorROI");
        for (name, value) in ir.as_tagged().unwrap().payload() {
            if name != "averageArea" {
                stripped.insert(name, value.clone());
            }
        }
        let err = f.unflatten(&stripped.into()).unwrap_err();
        assert!(err.to_string().contains("averageArea"), "{err}");
    }

    #[test]
    fn missing_base_field_is_malformed() {
        let ir: Ir = TaggedMap::new("PointROI").with(PLOT, Ir::Bool(false)).into();
        assert!(matches!(
            flattener().unflatten(&ir),
            Err(FlattenError::MalformedRepresentation { .. })
        ));
    }

    #[test]
    fn integer_coordinates_are_accepted() {
        let ir: Ir = TaggedMap::new("PointROI")
            .with(POINT, Ir::Array(vec![Ir::Int(3), Ir::Int(4)]))
            .with(PLOT, Ir::Bool(true))
            .into();
        assert_eq!(
            flattener().unflatten(&ir).unwrap(),
            Value::Roi(Roi::Point(RoiBase::new(3.0, 4.0).plotted(true)))
        );
    }

    #[test]
    fn wrong_arity_point_is_malformed() {
        let ir: Ir = TaggedMap::new("ROIBase")
            .with(POINT, Ir::Array(vec![Ir::Float(1.0)]))
            .with(PLOT, Ir::Bool(true))
            .into();
        assert!(matches!(
            flattener().unflatten(&ir),
            Err(FlattenError::MalformedRepresentation { .. })
        ));
    }

    #[test]
    fn typed_list_keeps_order_and_kind() {
        let f = flattener();
        let mut list = RoiList::new(RoiKind::Elliptical);
        for i in 0..3 {
            list.push(Roi::Elliptical(EllipticalRoi::new(RoiBase::new(i as f64, 0.0), 2.0, 1.0, 0.0)));
        }
        let value = Value::RoiList(list);
        let ir = f.flatten(&value).unwrap();
        assert_eq!(ir.type_key(), Some("EllipticalROIList"));
        assert_eq!(f.unflatten(&ir).unwrap(), value);
    }

    #[test]
    fn typed_list_rejects_foreign_shapes() {
        let f = flattener();
        let point = f.flatten(&Value::Roi(Roi::Point(RoiBase::new(0.0, 0.0)))).unwrap();
        let ir: Ir = TaggedMap::new("LinearROIList").with(CONTENT, Ir::Array(vec![point])).into();
        assert!(matches!(f.unflatten(&ir), Err(FlattenError::MalformedRepresentation { .. })));
    }
}
