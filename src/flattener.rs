//! Helper dispatch.
//!
//! A [`RootFlattener`] is an ordered list of [`Helper`]s. `flatten` and
//! `unflatten` hand the value to the first helper whose predicate claims it;
//! helpers recurse back into the flattener for nested values. Order matters:
//! tag-matching helpers go first, broad shape-matching ones last.
//!
//! The registry is assembled once (see [`standard`]) and never mutated after
//! it is shared, so concurrent calls need no locking.
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::FlattenerConfig;
use crate::error::{FlattenError, Result};
use crate::helpers;
use crate::ir::Ir;
use crate::spill::{BincodeStore, SpillDir};
use crate::value::{GuiParameter, PlotMode, Value};

/// Flatten/unflatten logic for one semantic category.
pub trait Helper: Send + Sync {
    /// Stable name, used in logs and in dispatch checks.
    fn type_name(&self) -> &'static str;

    fn can_flatten(&self, value: &Value) -> bool;

    fn flatten(&self, value: &Value, flattener: &RootFlattener) -> Result<Ir>;

    fn can_unflatten(&self, ir: &Ir) -> bool;

    fn unflatten(&self, ir: &Ir, flattener: &RootFlattener) -> Result<Value>;
}

#[derive(Default)]
pub struct RootFlattener {
    helpers: Vec<Box<dyn Helper>>,
}

impl RootFlattener {
    /// A flattener with no helpers; every call fails until some are added.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends; helpers added later act as fallbacks.
    pub fn add_helper(&mut self, helper: impl Helper + 'static) {
        self.helpers.push(Box::new(helper));
    }

    pub fn with_helper(mut self, helper: impl Helper + 'static) -> Self {
        self.add_helper(helper);
        self
    }

    pub fn flatten(&self, value: &Value) -> Result<Ir> {
        let helper = self
            .helpers
            .iter()
            .find(|h| h.can_flatten(value))
            .ok_or_else(|| FlattenError::UnsupportedType { type_name: value.type_name() })?;
        tracing::trace!(helper = helper.type_name(), value = %value.type_name(), "flatten");
        helper.flatten(value, self)
    }

    pub fn unflatten(&self, ir: &Ir) -> Result<Value> {
        let helper = self
            .helpers
            .iter()
            .find(|h| h.can_unflatten(ir))
            .ok_or_else(|| FlattenError::UnsupportedRepresentation { description: ir.describe() })?;
        tracing::trace!(helper = helper.type_name(), ir = %ir.describe(), "unflatten");
        helper.unflatten(ir, self)
    }

    /// Names of the registered helpers, in dispatch order.
    pub fn helper_names(&self) -> Vec<&'static str> {
        self.helpers.iter().map(|h| h.type_name()).collect()
    }

    /// Every helper that would claim `value`, not just the first.
    pub fn flatten_claimants(&self, value: &Value) -> Vec<&'static str> {
        self.helpers
            .iter()
            .filter(|h| h.can_flatten(value))
            .map(|h| h.type_name())
            .collect()
    }

    pub fn unflatten_claimants(&self, ir: &Ir) -> Vec<&'static str> {
        self.helpers
            .iter()
            .filter(|h| h.can_unflatten(ir))
            .map(|h| h.type_name())
            .collect()
    }
}

/// The full helper registry in its fixed dispatch order.
pub fn standard(config: &FlattenerConfig) -> RootFlattener {
    let spill = SpillDir::new(&config.spill_dir, Arc::new(BincodeStore));
    RootFlattener::empty()
        // tag-matched composites
        .with_helper(helpers::TypedNullHelper)
        .with_helper(helpers::MapHelper)
        .with_helper(helpers::RoiHelper)
        .with_helper(helpers::RoiListHelper)
        .with_helper(helpers::NameKeyedHelper::<GuiParameter>::new())
        .with_helper(helpers::NameKeyedHelper::<PlotMode>::new())
        .with_helper(helpers::IdentifierHelper)
        .with_helper(helpers::DatasetHelper::new(spill, config.delete_after_load))
        .with_helper(helpers::StateMapHelper)
        .with_helper(helpers::SelfDescribingHelper)
        // shape-matched
        .with_helper(helpers::PackedArrayHelper::Bool)
        .with_helper(helpers::PackedArrayHelper::Int)
        .with_helper(helpers::PackedArrayHelper::Float)
        .with_helper(helpers::ListHelper)
        .with_helper(helpers::PassthroughHelper)
}

static GLOBAL: OnceCell<RootFlattener> = OnceCell::new();

/// Process-wide flattener built from [`FlattenerConfig::from_env`] on first use.
pub fn global() -> &'static RootFlattener {
    GLOBAL.get_or_init(|| standard(&FlattenerConfig::from_env()))
}

pub fn flatten(value: &Value) -> Result<Ir> {
    global().flatten(value)
}

pub fn unflatten(ir: &Ir) -> Result<Value> {
    global().unflatten(ir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TaggedMap;
    use crate::value::*;
    use proptest::prelude::*;

    fn flattener() -> RootFlattener {
        standard(&FlattenerConfig::default())
    }

    fn base() -> impl Strategy<Value = RoiBase> {
        (-1e3..1e3f64, -1e3..1e3f64, any::<bool>()).prop_map(|(x, y, plot)| RoiBase::new(x, y).plotted(plot))
    }

    fn roi() -> impl Strategy<Value = Roi> {
        prop_oneof![
            base().prop_map(Roi::Base),
            base().prop_map(Roi::Point),
            (base(), 0.0..10.0f64, -3.0..3.0f64).prop_map(|(b, l, a)| Roi::Linear(LinearRoi::new(b, l, a))),
            (base(), 0.0..10.0f64, 0.0..10.0f64)
                .prop_map(|(b, w, h)| Roi::Rectangular(RectangularRoi::new(b, w, h, 0.0))),
            (base(), 0.0..10.0f64, 0.0..10.0f64)
                .prop_map(|(b, a, c)| Roi::Elliptical(EllipticalRoi::new(b, a, c, 0.0))),
            base().prop_map(|b| Roi::Sector(SectorRoi::new(b, [1.0, 2.0], [0.0, 1.5]))),
        ]
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            any::<f64>().prop_map(Value::Float),
            ".*".prop_map(Value::Str),
            proptest::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
            "[A-Za-z]{1,8}".prop_map(|n| Value::TypedNull(DeclaredType::resolve(&n))),
        ]
    }

    fn catalogue_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            scalar(),
            proptest::collection::vec(scalar(), 0..4).prop_map(Value::List),
            proptest::collection::vec(any::<f64>(), 0..4).prop_map(Value::from),
            proptest::collection::vec(any::<i64>(), 0..4).prop_map(Value::from),
            proptest::collection::vec(any::<bool>(), 0..4).prop_map(Value::from),
            proptest::collection::vec((scalar(), scalar()), 0..4)
                .prop_map(|kv| Value::Map(kv.into_iter().collect())),
            roi().prop_map(Value::Roi),
            proptest::collection::vec(base(), 0..3).prop_map(|bs| {
                let mut list = RoiList::new(RoiKind::Point);
                for b in bs {
                    list.push(Roi::Point(b));
                }
                Value::RoiList(list)
            }),
            proptest::sample::select(GuiParameter::TABLE.iter().map(|(_, p)| *p).collect::<Vec<_>>())
                .prop_map(Value::GuiParameter),
            proptest::sample::select(PlotMode::TABLE.iter().map(|(_, m)| *m).collect::<Vec<_>>())
                .prop_map(Value::PlotMode),
            any::<u128>().prop_map(|n| Value::Uuid(uuid::Uuid::from_u128(n))),
            proptest::collection::vec(any::<f64>(), 0..4).prop_map(|xs| Value::Dataset(Dataset::from_f64("d", xs))),
            Just(Value::StateMap(StateMap::new().with(GuiParameter::Title, "t"))),
            Just(Value::Described(Described::new(Histogram::new(vec![0.0, 1.0], vec![2]).unwrap()))),
            Just(Value::Array(TypedArray::Homogeneous { kind: ValueKind::Str, items: vec!["a".into()] })),
        ]
    }

    proptest! {
        #[test]
        fn exactly_one_helper_claims_each_value(value in catalogue_value()) {
            let claimants = flattener().flatten_claimants(&value);
            prop_assert_eq!(claimants.len(), 1, "{:?} claimed by {:?}", value, claimants);
        }
    }

    #[test]
    fn helper_order_is_fixed() {
        assert_eq!(
            flattener().helper_names(),
            vec![
                "TypedNone",
                "Map",
                "ROI",
                "ROIList",
                "GuiParameter",
                "PlotMode",
                "uuid",
                "Dataset",
                "GuiBean",
                "SelfDescribing",
                "bool[]",
                "int[]",
                "float[]",
                "list",
                "passthrough",
            ]
        );
    }

    #[test]
    fn empty_flattener_rejects_everything() {
        let empty = RootFlattener::empty();
        assert!(matches!(
            empty.flatten(&Value::Int(1)),
            Err(FlattenError::UnsupportedType { type_name }) if type_name == "int"
        ));
        assert!(matches!(empty.unflatten(&Ir::Int(1)), Err(FlattenError::UnsupportedRepresentation { .. })));
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let ir = Ir::TaggedMap(TaggedMap::new("NoSuchThing"));
        let err = flattener().unflatten(&ir).unwrap_err();
        assert!(matches!(err, FlattenError::UnsupportedRepresentation { ref description } if description.contains("NoSuchThing")));
    }

    #[test]
    fn tag_is_independent_of_nesting() {
        let f = flattener();
        let rect = Value::Roi(Roi::Rectangular(RectangularRoi::new(RoiBase::new(1.0, 1.0), 2.0, 3.0, 0.0)));
        let alone = f.flatten(&rect).unwrap();
        let nested = f.flatten(&Value::List(vec![Value::Int(1), Value::List(vec![rect.clone()])])).unwrap();
        let Ir::Array(outer) = nested else { panic!("expected array") };
        let Ir::Array(inner) = &outer[1] else { panic!("expected array") };
        assert_eq!(alone.type_key(), Some("RectangularROI"));
        assert_eq!(inner[0].type_key(), alone.type_key());
        assert_eq!(inner[0], alone);
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let f = Arc::new(flattener());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = Arc::clone(&f);
                std::thread::spawn(move || {
                    let v = Value::List(vec![Value::Int(i), Value::from("x")]);
                    f.unflatten(&f.flatten(&v).unwrap()).unwrap() == v
                })
            })
            .collect();
        assert!(handles.into_iter().all(|h| h.join().unwrap()));
    }

    #[test]
    fn global_registry_is_built_once_and_round_trips() {
        assert!(std::ptr::eq(global(), global()));
        assert_eq!(global().helper_names(), flattener().helper_names());

        let v = Value::List(vec![Value::Int(3), Value::Null, Value::from("y")]);
        let ir = super::flatten(&v).unwrap();
        assert_eq!(ir, flattener().flatten(&v).unwrap());
        assert_eq!(super::unflatten(&ir).unwrap(), v);
    }
}
