//! The registered helpers, one module per family.
pub mod container;
pub mod dataset;
pub mod described;
pub mod named;
pub mod roi;
pub mod scalar;
pub mod state;

pub use container::{ListHelper, MapHelper, PackedArrayHelper, specialize};
pub use dataset::DatasetHelper;
pub use described::SelfDescribingHelper;
pub use named::{IdentifierHelper, NameKeyedHelper};
pub use roi::{RoiHelper, RoiListHelper};
pub use scalar::{PassthroughHelper, TypedNullHelper};
pub use state::StateMapHelper;

use crate::error::{FlattenError, Result};
use crate::ir::{Ir, TaggedMap};

/// The tagged map behind `ir`, or a malformed-representation error naming `type_key`.
pub(crate) fn expect_tagged<'a>(ir: &'a Ir, type_key: &str) -> Result<&'a TaggedMap> {
    match ir {
        Ir::TaggedMap(map) if map.type_key() == type_key => Ok(map),
        other => Err(FlattenError::malformed(type_key, format!("expected tagged map, found {}", other.describe()))),
    }
}

/// Helpers only claim values of their own variant; reaching the fallback arm
/// means `flatten` was called without `can_flatten`.
pub(crate) fn not_claimed(value: &crate::value::Value) -> FlattenError {
    FlattenError::UnsupportedType { type_name: value.type_name() }
}
