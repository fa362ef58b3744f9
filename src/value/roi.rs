//! Region-of-interest shapes.
//!
//! Every shape shares a [`RoiBase`] (anchor point + plot flag) and adds its own
//! fields. `RoiKind` carries the wire tags of each shape and of its list form.
use ordered_float::OrderedFloat;

use super::ValueKind;

/// Float fields compare by content, so NaN equals NaN.
fn same(a: f64, b: f64) -> bool {
    OrderedFloat(a) == OrderedFloat(b)
}

fn same_pair(a: [f64; 2], b: [f64; 2]) -> bool {
    same(a[0], b[0]) && same(a[1], b[1])
}

#[derive(Debug, Clone, Copy)]
pub struct RoiBase {
    /// Anchor point `[x, y]`.
    pub point: [f64; 2],
    /// Whether the shape participates in plotting.
    pub plot: bool,
}

impl RoiBase {
    pub fn new(x: f64, y: f64) -> Self {
        Self { point: [x, y], plot: false }
    }

    pub fn plotted(mut self, plot: bool) -> Self {
        self.plot = plot;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinearRoi {
    pub base: RoiBase,
    pub length: f64,
    /// Radians.
    pub angle: f64,
    pub cross_hair: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RectangularRoi {
    pub base: RoiBase,
    pub lengths: [f64; 2],
    pub angle: f64,
    pub clipping_compensation: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EllipticalRoi {
    pub base: RoiBase,
    pub semi_axes: [f64; 2],
    pub angle: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SectorRoi {
    pub base: RoiBase,
    /// Inner and outer radius.
    pub radii: [f64; 2],
    /// Start and end angle.
    pub angles: [f64; 2],
    pub clipping_compensation: bool,
    pub symmetry: i64,
    pub combine_symmetry: bool,
    pub average_area: bool,
}

impl LinearRoi {
    pub fn new(base: RoiBase, length: f64, angle: f64) -> Self {
        Self { base, length, angle, cross_hair: false }
    }
}

impl RectangularRoi {
    pub fn new(base: RoiBase, width: f64, height: f64, angle: f64) -> Self {
        Self { base, lengths: [width, height], angle, clipping_compensation: false }
    }
}

impl EllipticalRoi {
    pub fn new(base: RoiBase, major: f64, minor: f64, angle: f64) -> Self {
        Self { base, semi_axes: [major, minor], angle }
    }
}

impl SectorRoi {
    pub fn new(base: RoiBase, radii: [f64; 2], angles: [f64; 2]) -> Self {
        Self {
            base,
            radii,
            angles,
            clipping_compensation: false,
            symmetry: 0,
            combine_symmetry: false,
            average_area: false,
        }
    }
}

impl PartialEq for RoiBase {
    fn eq(&self, other: &Self) -> bool {
        same_pair(self.point, other.point) && self.plot == other.plot
    }
}

impl PartialEq for LinearRoi {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && same(self.length, other.length)
            && same(self.angle, other.angle)
            && self.cross_hair == other.cross_hair
    }
}

impl PartialEq for RectangularRoi {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && same_pair(self.lengths, other.lengths)
            && same(self.angle, other.angle)
            && self.clipping_compensation == other.clipping_compensation
    }
}

impl PartialEq for EllipticalRoi {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && same_pair(self.semi_axes, other.semi_axes) && same(self.angle, other.angle)
    }
}

impl PartialEq for SectorRoi {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && same_pair(self.radii, other.radii)
            && same_pair(self.angles, other.angles)
            && self.clipping_compensation == other.clipping_compensation
            && self.symmetry == other.symmetry
            && self.combine_symmetry == other.combine_symmetry
            && self.average_area == other.average_area
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Roi {
    /// The abstract base shape on its own.
    Base(RoiBase),
    Point(RoiBase),
    Linear(LinearRoi),
    Rectangular(RectangularRoi),
    Elliptical(EllipticalRoi),
    Sector(SectorRoi),
}

impl Roi {
    pub fn kind(&self) -> RoiKind {
        match self {
            Roi::Base(_) => RoiKind::Base,
            Roi::Point(_) => RoiKind::Point,
            Roi::Linear(_) => RoiKind::Linear,
            Roi::Rectangular(_) => RoiKind::Rectangular,
            Roi::Elliptical(_) => RoiKind::Elliptical,
            Roi::Sector(_) => RoiKind::Sector,
        }
    }

    pub fn base(&self) -> &RoiBase {
        match self {
            Roi::Base(base) | Roi::Point(base) => base,
            Roi::Linear(roi) => &roi.base,
            Roi::Rectangular(roi) => &roi.base,
            Roi::Elliptical(roi) => &roi.base,
            Roi::Sector(roi) => &roi.base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoiKind {
    Base,
    Point,
    Linear,
    Rectangular,
    Elliptical,
    Sector,
}

impl RoiKind {
    pub const ALL: [RoiKind; 6] = [
        RoiKind::Base,
        RoiKind::Point,
        RoiKind::Linear,
        RoiKind::Rectangular,
        RoiKind::Elliptical,
        RoiKind::Sector,
    ];

    pub fn value_kind(self) -> ValueKind {
        match self {
            RoiKind::Base => ValueKind::RoiBase,
            RoiKind::Point => ValueKind::PointRoi,
            RoiKind::Linear => ValueKind::LinearRoi,
            RoiKind::Rectangular => ValueKind::RectangularRoi,
            RoiKind::Elliptical => ValueKind::EllipticalRoi,
            RoiKind::Sector => ValueKind::SectorRoi,
        }
    }

    /// The base shape has no list form of its own.
    pub fn list_value_kind(self) -> ValueKind {
        match self {
            RoiKind::Base | RoiKind::Point => ValueKind::PointRoiList,
            RoiKind::Linear => ValueKind::LinearRoiList,
            RoiKind::Rectangular => ValueKind::RectangularRoiList,
            RoiKind::Elliptical => ValueKind::EllipticalRoiList,
            RoiKind::Sector => ValueKind::SectorRoiList,
        }
    }

    /// Wire tag of a single shape.
    pub fn type_key(self) -> &'static str {
        self.value_kind().name()
    }

    pub fn list_type_key(self) -> &'static str {
        self.list_value_kind().name()
    }

    pub fn from_type_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_key() == key)
    }

    pub fn from_list_type_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|kind| *kind != RoiKind::Base)
            .find(|kind| kind.list_type_key() == key)
    }
}

/// Ordered list of shapes that all have the same kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiList {
    kind: RoiKind,
    items: Vec<Roi>,
}

impl RoiList {
    /// The base shape has no list form; asking for one yields a point list.
    pub fn new(kind: RoiKind) -> Self {
        let kind = if kind == RoiKind::Base { RoiKind::Point } else { kind };
        Self { kind, items: Vec::new() }
    }

    /// Build from shapes, inferring the kind from the first one.
    /// `None` if empty or mixed.
    pub fn from_rois(items: Vec<Roi>) -> Option<Self> {
        let mut list = Self::new(items.first()?.kind());
        for roi in items {
            if !list.push(roi) {
                return None;
            }
        }
        Some(list)
    }

    /// Appends if the shape has the list's kind.
    pub fn push(&mut self, roi: Roi) -> bool {
        if roi.kind() != self.kind {
            return false;
        }
        self.items.push(roi);
        true
    }

    pub fn kind(&self) -> RoiKind {
        self.kind
    }

    pub fn items(&self) -> &[Roi] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
