//! Enumeration-like constants that cross the boundary by name.
//!
//! Each category keeps a static `(name, variant)` table; the table is the only
//! source of truth for both directions.
use std::fmt;

use super::Value;

pub trait Enumerant: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Wire tag of the category.
    const CATEGORY: &'static str;
    const TABLE: &'static [(&'static str, Self)];

    fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, variant)| *variant == self)
            .map(|(name, _)| *name)
            .unwrap_or("")
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::TABLE.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

/// Named slots of the GUI state map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuiParameter {
    PlotMode,
    Title,
    Roi,
    RoiList,
    PlotId,
    PlotOperation,
    FileList,
    FileName,
    QuietUpdate,
    ImageGridXPos,
    ImageGridYPos,
    ImageGridSize,
    Metadata,
    AxisData,
    FileOperation,
    Masking,
}

impl Enumerant for GuiParameter {
    const CATEGORY: &'static str = "GuiParameter";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("PlotMode", GuiParameter::PlotMode),
        ("Title", GuiParameter::Title),
        ("ROI", GuiParameter::Roi),
        ("ROIList", GuiParameter::RoiList),
        ("PlotID", GuiParameter::PlotId),
        ("PlotOperation", GuiParameter::PlotOperation),
        ("FileList", GuiParameter::FileList),
        ("FileName", GuiParameter::FileName),
        ("QuietUpdate", GuiParameter::QuietUpdate),
        ("ImageGridXPos", GuiParameter::ImageGridXPos),
        ("ImageGridYPos", GuiParameter::ImageGridYPos),
        ("ImageGridSize", GuiParameter::ImageGridSize),
        ("Metadata", GuiParameter::Metadata),
        ("AxisData", GuiParameter::AxisData),
        ("FileOperation", GuiParameter::FileOperation),
        ("Masking", GuiParameter::Masking),
    ];

    fn into_value(self) -> Value {
        Value::GuiParameter(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::GuiParameter(p) => Some(*p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotMode {
    OneD,
    OneDStack,
    TwoD,
    Surface2D,
    Scatter2D,
    Scatter3D,
    MultiImage,
    Empty,
}

impl Enumerant for PlotMode {
    const CATEGORY: &'static str = "PlotMode";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("ONED", PlotMode::OneD),
        ("ONED_THREED", PlotMode::OneDStack),
        ("TWOD", PlotMode::TwoD),
        ("SURF2D", PlotMode::Surface2D),
        ("SCATTER2D", PlotMode::Scatter2D),
        ("SCATTER3D", PlotMode::Scatter3D),
        ("MULTI2D", PlotMode::MultiImage),
        ("EMPTY", PlotMode::Empty),
    ];

    fn into_value(self) -> Value {
        Value::PlotMode(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::PlotMode(m) => Some(*m),
            _ => None,
        }
    }
}

impl fmt::Display for GuiParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PlotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
