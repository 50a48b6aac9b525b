//! Typed accessor reader
//!
//! Extracts strided little-endian elements from a byte buffer into a
//! contiguous typed sequence.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::document::Document;
use crate::error::{ImportError, ImportResult};

/// Upper bound on components materialised for an accessor without a buffer
/// view (16 Mi components).
pub const MAX_ZERO_FILLED_COMPONENTS: usize = 1 << 24;

/// glTF component encoding (`accessor.componentType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum ComponentType {
    I8 = 5120,
    U8 = 5121,
    I16 = 5122,
    U16 = 5123,
    I32 = 5124,
    U32 = 5125,
    F32 = 5126,
}

impl ComponentType {
    pub fn byte_size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::I32 | ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    pub fn is_integer(self) -> bool {
        self != ComponentType::F32
    }
}

/// glTF element shape (`accessor.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC2")]
    Vec2,
    #[serde(rename = "VEC3")]
    Vec3,
    #[serde(rename = "VEC4")]
    Vec4,
    #[serde(rename = "MAT2")]
    Mat2,
    #[serde(rename = "MAT3")]
    Mat3,
    #[serde(rename = "MAT4")]
    Mat4,
}

impl ElementType {
    /// Number of components per element
    pub fn arity(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

/// Flat component sequence, tagged with the source encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl AccessorData {
    /// Number of components (not elements).
    pub fn len(&self) -> usize {
        match self {
            AccessorData::I8(v) => v.len(),
            AccessorData::U8(v) => v.len(),
            AccessorData::I16(v) => v.len(),
            AccessorData::U16(v) => v.len(),
            AccessorData::I32(v) => v.len(),
            AccessorData::U32(v) => v.len(),
            AccessorData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            AccessorData::I8(_) => ComponentType::I8,
            AccessorData::U8(_) => ComponentType::U8,
            AccessorData::I16(_) => ComponentType::I16,
            AccessorData::U16(_) => ComponentType::U16,
            AccessorData::I32(_) => ComponentType::I32,
            AccessorData::U32(_) => ComponentType::U32,
            AccessorData::F32(_) => ComponentType::F32,
        }
    }

    /// `components` zeros of the given encoding.
    pub fn zeroed(component_type: ComponentType, components: usize) -> Self {
        match component_type {
            ComponentType::I8 => AccessorData::I8(vec![0; components]),
            ComponentType::U8 => AccessorData::U8(vec![0; components]),
            ComponentType::I16 => AccessorData::I16(vec![0; components]),
            ComponentType::U16 => AccessorData::U16(vec![0; components]),
            ComponentType::I32 => AccessorData::I32(vec![0; components]),
            ComponentType::U32 => AccessorData::U32(vec![0; components]),
            ComponentType::F32 => AccessorData::F32(vec![0.0; components]),
        }
    }

    /// Convert to floats. With `normalized`, integer components map to
    /// [0, 1] (unsigned) or [-1, 1] (signed) using the glTF rules.
    pub fn to_f32(&self, normalized: bool) -> Vec<f32> {
        match (self, normalized) {
            (AccessorData::F32(v), _) => v.clone(),
            (AccessorData::I8(v), true) => v.iter().map(|&c| (c as f32 / 127.0).max(-1.0)).collect(),
            (AccessorData::U8(v), true) => v.iter().map(|&c| c as f32 / 255.0).collect(),
            (AccessorData::I16(v), true) => {
                v.iter().map(|&c| (c as f32 / 32767.0).max(-1.0)).collect()
            }
            (AccessorData::U16(v), true) => v.iter().map(|&c| c as f32 / 65535.0).collect(),
            (AccessorData::I8(v), false) => v.iter().map(|&c| c as f32).collect(),
            (AccessorData::U8(v), false) => v.iter().map(|&c| c as f32).collect(),
            (AccessorData::I16(v), false) => v.iter().map(|&c| c as f32).collect(),
            (AccessorData::U16(v), false) => v.iter().map(|&c| c as f32).collect(),
            // 32-bit integers are never normalized in glTF
            (AccessorData::I32(v), _) => v.iter().map(|&c| c as f32).collect(),
            (AccessorData::U32(v), _) => v.iter().map(|&c| c as f32).collect(),
        }
    }

    /// Convert unsigned integer data to `u32` (index buffers).
    pub fn to_u32(&self) -> ImportResult<Vec<u32>> {
        match self {
            AccessorData::U8(v) => Ok(v.iter().map(|&c| c as u32).collect()),
            AccessorData::U16(v) => Ok(v.iter().map(|&c| c as u32).collect()),
            AccessorData::U32(v) => Ok(v.clone()),
            other => Err(ImportError::Schema(format!(
                "expected unsigned integer components, found {:?}",
                other.component_type()
            ))),
        }
    }

    /// Interpret float data as column-major 4x4 matrices.
    pub fn to_mat4s(&self) -> ImportResult<Vec<Mat4>> {
        let AccessorData::F32(values) = self else {
            return Err(ImportError::Schema(format!(
                "matrices must be FLOAT, found {:?}",
                self.component_type()
            )));
        };
        if values.len() % 16 != 0 {
            return Err(ImportError::Schema(format!(
                "{} floats do not form whole 4x4 matrices",
                values.len()
            )));
        }
        Ok(values.chunks_exact(16).map(Mat4::from_cols_slice).collect())
    }

    /// Tightly packed bytes in host order, ready for upload.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            AccessorData::I8(v) => bytemuck::cast_slice(v).to_vec(),
            AccessorData::U8(v) => v.clone(),
            AccessorData::I16(v) => bytemuck::cast_slice(v).to_vec(),
            AccessorData::U16(v) => bytemuck::cast_slice(v).to_vec(),
            AccessorData::I32(v) => bytemuck::cast_slice(v).to_vec(),
            AccessorData::U32(v) => bytemuck::cast_slice(v).to_vec(),
            AccessorData::F32(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }
}

/// Read `count` elements of `element_type` starting at `byte_offset`.
///
/// A `byte_stride` of 0 means tightly packed. A nonzero stride is the byte
/// distance between the starts of consecutive elements.
pub fn read(
    buffer: &[u8],
    element_type: ElementType,
    component_type: ComponentType,
    count: usize,
    byte_offset: usize,
    byte_stride: usize,
) -> ImportResult<AccessorData> {
    let arity = element_type.arity();
    let width = component_type.byte_size();
    let element_size = arity * width;
    let stride = if byte_stride == 0 { element_size } else { byte_stride };

    if count > 0 {
        let end = (count - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(byte_offset))
            .and_then(|start| start.checked_add(element_size));
        match end {
            Some(end) if end <= buffer.len() => {}
            _ => {
                return Err(ImportError::Range(format!(
                    "{count} x {element_size}-byte elements at offset {byte_offset} stride {stride} exceed {} bytes",
                    buffer.len()
                )));
            }
        }
    }

    let layout = Layout {
        count,
        arity,
        byte_offset,
        stride,
    };
    let data = match component_type {
        ComponentType::I8 => AccessorData::I8(layout.collect(buffer, i8::from_le_bytes)),
        ComponentType::U8 => AccessorData::U8(layout.collect(buffer, u8::from_le_bytes)),
        ComponentType::I16 => AccessorData::I16(layout.collect(buffer, i16::from_le_bytes)),
        ComponentType::U16 => AccessorData::U16(layout.collect(buffer, u16::from_le_bytes)),
        ComponentType::I32 => AccessorData::I32(layout.collect(buffer, i32::from_le_bytes)),
        ComponentType::U32 => AccessorData::U32(layout.collect(buffer, u32::from_le_bytes)),
        ComponentType::F32 => AccessorData::F32(layout.collect(buffer, f32::from_le_bytes)),
    };
    Ok(data)
}

struct Layout {
    count: usize,
    arity: usize,
    byte_offset: usize,
    stride: usize,
}

impl Layout {
    /// Caller has already checked that every element lies inside `buffer`.
    fn collect<T, const N: usize>(&self, buffer: &[u8], decode: impl Fn([u8; N]) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(self.count * self.arity);
        for i in 0..self.count {
            let start = self.byte_offset + i * self.stride;
            for j in 0..self.arity {
                let at = start + j * N;
                let mut bytes = [0u8; N];
                bytes.copy_from_slice(&buffer[at..at + N]);
                out.push(decode(bytes));
            }
        }
        out
    }
}

/// Accessor contents resolved through its buffer view.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorValues {
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    pub data: AccessorData,
}

impl AccessorValues {
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.to_f32(self.normalized)
    }
}

/// Resolve accessor `index` of `document` against the loaded `buffers`.
///
/// The accessor range is checked against its buffer view, and the view
/// against its buffer.
pub fn read_accessor(
    document: &Document,
    buffers: &[Vec<u8>],
    index: usize,
) -> ImportResult<AccessorValues> {
    let accessor = document.accessors.get(index).ok_or_else(|| {
        ImportError::Range(format!(
            "accessor {index} out of bounds ({} accessors)",
            document.accessors.len()
        ))
    })?;

    if accessor.sparse.is_some() {
        return Err(ImportError::Schema(format!(
            "accessor {index} is sparse, which is not supported"
        )));
    }

    let data = match accessor.buffer_view {
        None => {
            let components = accessor
                .count
                .checked_mul(accessor.element_type.arity())
                .filter(|&n| n <= MAX_ZERO_FILLED_COMPONENTS)
                .ok_or_else(|| {
                    ImportError::Range(format!(
                        "accessor {index} has no buffer view and {} elements, more than can be zero-filled",
                        accessor.count
                    ))
                })?;
            AccessorData::zeroed(accessor.component_type, components)
        }
        Some(view_index) => {
            let view = document.buffer_views.get(view_index).ok_or_else(|| {
                ImportError::Range(format!(
                    "accessor {index} references buffer view {view_index} ({} views)",
                    document.buffer_views.len()
                ))
            })?;
            let buffer = buffers.get(view.buffer).ok_or_else(|| {
                ImportError::Range(format!(
                    "buffer view {view_index} references buffer {} ({} buffers)",
                    view.buffer,
                    buffers.len()
                ))
            })?;
            let view_end = view
                .byte_offset
                .checked_add(view.byte_length)
                .filter(|&end| end <= buffer.len())
                .ok_or_else(|| {
                    ImportError::Range(format!(
                        "buffer view {view_index} ({} bytes at {}) exceeds buffer {} ({} bytes)",
                        view.byte_length,
                        view.byte_offset,
                        view.buffer,
                        buffer.len()
                    ))
                })?;

            read(
                &buffer[view.byte_offset..view_end],
                accessor.element_type,
                accessor.component_type,
                accessor.count,
                accessor.byte_offset,
                view.byte_stride.unwrap_or(0),
            )
            .map_err(|err| match err {
                ImportError::Range(msg) => {
                    ImportError::Range(format!("accessor {index} in view {view_index}: {msg}"))
                }
                other => other,
            })?
        }
    };

    Ok(AccessorValues {
        element_type: accessor.element_type,
        count: accessor.count,
        normalized: accessor.normalized,
        data,
    })
}
