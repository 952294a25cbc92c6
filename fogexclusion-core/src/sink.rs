//! Render-uniform sinks.
//!
//! A manager never touches global shader state directly. It is handed a
//! [`UniformSink`] at construction and writes every published value through it.
//! Engine integrations implement the trait on top of their own global
//! shader-property API; [`UniformStore`] is an in-memory table usable as the
//! process-wide render state, and [`RecordingSink`] captures calls for inspection.

use crate::math::{Mat4, Vec4};
use std::collections::HashMap;

/// Well-known global shader property names read by the fog shader.
pub mod properties {
    /// `CAP` × `float4(x, y, z, 0)` box centers.
    pub const POSITIONS: &str = "_UdonExclusionBoxPositions";
    /// `CAP` × `float4(x, y, z, 0)` box half extents.
    pub const SIZES: &str = "_UdonExclusionBoxSizes";
    /// `CAP` × `float4x4` world-to-local matrices.
    pub const WORLD_TO_LOCAL: &str = "_UdonExclusionBoxWorldToLocal";
    /// `CAP` × `float` rotation hints (0 or 1).
    pub const USE_ROTATION: &str = "_UdonExclusionBoxUseRotation";
    /// `int` number of live slots.
    pub const COUNT: &str = "_UdonExclusionBoxCount";

    pub const ALL: [&str; 5] = [POSITIONS, SIZES, WORLD_TO_LOCAL, USE_ROTATION, COUNT];
}

/// Write-only access to global shader inputs.
///
/// Each call replaces the whole value stored under `id`.
pub trait UniformSink {
    fn set_vector_array(&mut self, id: &str, values: &[Vec4]);

    fn set_matrix_array(&mut self, id: &str, values: &[Mat4]);

    fn set_float_array(&mut self, id: &str, values: &[f32]);

    fn set_integer(&mut self, id: &str, value: i32);
}

impl<S: UniformSink + ?Sized> UniformSink for &mut S {
    fn set_vector_array(&mut self, id: &str, values: &[Vec4]) {
        (**self).set_vector_array(id, values);
    }

    fn set_matrix_array(&mut self, id: &str, values: &[Mat4]) {
        (**self).set_matrix_array(id, values);
    }

    fn set_float_array(&mut self, id: &str, values: &[f32]) {
        (**self).set_float_array(id, values);
    }

    fn set_integer(&mut self, id: &str, value: i32) {
        (**self).set_integer(id, value);
    }
}

impl<S: UniformSink + ?Sized> UniformSink for Box<S> {
    fn set_vector_array(&mut self, id: &str, values: &[Vec4]) {
        (**self).set_vector_array(id, values);
    }

    fn set_matrix_array(&mut self, id: &str, values: &[Mat4]) {
        (**self).set_matrix_array(id, values);
    }

    fn set_float_array(&mut self, id: &str, values: &[f32]) {
        (**self).set_float_array(id, values);
    }

    fn set_integer(&mut self, id: &str, value: i32) {
        (**self).set_integer(id, value);
    }
}

/// A single stored global value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    VectorArray(Vec<Vec4>),
    MatrixArray(Vec<Mat4>),
    FloatArray(Vec<f32>),
    Integer(i32),
}

/// In-memory global shader property table.
///
/// Holds the last value written under each identifier, the way a graphics API's
/// global shader state does. Readers (the CPU-side consumer, debug views) query
/// it by identifier.
#[derive(Debug, Default, Clone)]
pub struct UniformStore {
    values: HashMap<String, UniformValue>,
    writes: u64,
}

impl UniformStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&UniformValue> {
        self.values.get(id)
    }

    pub fn vector_array(&self, id: &str) -> Option<&[Vec4]> {
        match self.values.get(id) {
            Some(UniformValue::VectorArray(values)) => Some(values),
            _ => None,
        }
    }

    pub fn matrix_array(&self, id: &str) -> Option<&[Mat4]> {
        match self.values.get(id) {
            Some(UniformValue::MatrixArray(values)) => Some(values),
            _ => None,
        }
    }

    pub fn float_array(&self, id: &str) -> Option<&[f32]> {
        match self.values.get(id) {
            Some(UniformValue::FloatArray(values)) => Some(values),
            _ => None,
        }
    }

    pub fn integer(&self, id: &str) -> Option<i32> {
        match self.values.get(id) {
            Some(UniformValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// Total number of individual writes received.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    fn insert(&mut self, id: &str, value: UniformValue) {
        self.writes += 1;
        self.values.insert(id.to_string(), value);
    }
}

impl UniformSink for UniformStore {
    fn set_vector_array(&mut self, id: &str, values: &[Vec4]) {
        self.insert(id, UniformValue::VectorArray(values.to_vec()));
    }

    fn set_matrix_array(&mut self, id: &str, values: &[Mat4]) {
        self.insert(id, UniformValue::MatrixArray(values.to_vec()));
    }

    fn set_float_array(&mut self, id: &str, values: &[f32]) {
        self.insert(id, UniformValue::FloatArray(values.to_vec()));
    }

    fn set_integer(&mut self, id: &str, value: i32) {
        self.insert(id, UniformValue::Integer(value));
    }
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SinkCall {
    pub id: String,
    pub value: UniformValue,
}

/// Sink that records every call in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Most recent value written under `id`.
    pub fn last(&self, id: &str) -> Option<&UniformValue> {
        self.calls
            .iter()
            .rev()
            .find(|call| call.id == id)
            .map(|call| &call.value)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Drops recorded calls and returns them.
    pub fn take(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }

    fn record(&mut self, id: &str, value: UniformValue) {
        self.calls.push(SinkCall {
            id: id.to_string(),
            value,
        });
    }
}

impl UniformSink for RecordingSink {
    fn set_vector_array(&mut self, id: &str, values: &[Vec4]) {
        self.record(id, UniformValue::VectorArray(values.to_vec()));
    }

    fn set_matrix_array(&mut self, id: &str, values: &[Mat4]) {
        self.record(id, UniformValue::MatrixArray(values.to_vec()));
    }

    fn set_float_array(&mut self, id: &str, values: &[f32]) {
        self.record(id, UniformValue::FloatArray(values.to_vec()));
    }

    fn set_integer(&mut self, id: &str, value: i32) {
        self.record(id, UniformValue::Integer(value));
    }
}
