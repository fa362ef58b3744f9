//! Bulk numeric payloads. These never travel inline; see `helpers::dataset`.
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub name: Option<String>,
    /// Row-major; the product equals the element count.
    pub shape: Vec<usize>,
    pub data: NumericData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NumericData {
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Int32(Vec<i32>),
}

impl NumericData {
    pub fn len(&self) -> usize {
        match self {
            NumericData::Float64(xs) => xs.len(),
            NumericData::Int64(xs) => xs.len(),
            NumericData::Int32(xs) => xs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for NumericData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumericData::Float64(a), NumericData::Float64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| OrderedFloat(*x) == OrderedFloat(*y))
            }
            (NumericData::Int64(a), NumericData::Int64(b)) => a == b,
            (NumericData::Int32(a), NumericData::Int32(b)) => a == b,
            _ => false,
        }
    }
}

impl Dataset {
    fn one_dimensional(name: impl Into<String>, data: NumericData) -> Self {
        Self { name: Some(name.into()), shape: vec![data.len()], data }
    }

    pub fn from_f64(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self::one_dimensional(name, NumericData::Float64(data))
    }

    pub fn from_i64(name: impl Into<String>, data: Vec<i64>) -> Self {
        Self::one_dimensional(name, NumericData::Int64(data))
    }

    pub fn from_i32(name: impl Into<String>, data: Vec<i32>) -> Self {
        Self::one_dimensional(name, NumericData::Int32(data))
    }

    /// `None` if the shape does not cover exactly the element count.
    pub fn reshape(mut self, shape: Vec<usize>) -> Option<Self> {
        if shape.iter().product::<usize>() != self.data.len() {
            return None;
        }
        self.shape = shape;
        Some(self)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.shape == other.shape && self.data == other.data
    }
}
