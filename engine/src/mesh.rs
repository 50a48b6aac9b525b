//! Mesh primitives: CPU streams produced at import, GPU handles after upload.

use crate::accessor::{AccessorData, AccessorValues, ComponentType};
use crate::backend::{
    IndexBufferHandle, IndexFormat, RenderBackend, VertexBufferHandle, VertexLayout,
};
use crate::document::PrimitiveMode;
use crate::error::{ImportError, ImportResult};

/// Vertex attribute semantics the engine binds, with fixed shader locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Normal,
    TexCoord0,
    Joints0,
    Weights0,
}

impl Semantic {
    pub const ALL: [Semantic; 5] = [
        Semantic::Position,
        Semantic::Normal,
        Semantic::TexCoord0,
        Semantic::Joints0,
        Semantic::Weights0,
    ];

    pub fn attribute_name(self) -> &'static str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Normal => "NORMAL",
            Semantic::TexCoord0 => "TEXCOORD_0",
            Semantic::Joints0 => "JOINTS_0",
            Semantic::Weights0 => "WEIGHTS_0",
        }
    }

    pub fn from_attribute_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.attribute_name() == name)
    }

    pub fn location(self) -> u32 {
        match self {
            Semantic::Position => 0,
            Semantic::Normal => 1,
            Semantic::TexCoord0 => 2,
            Semantic::Joints0 => 3,
            Semantic::Weights0 => 4,
        }
    }
}

/// One tightly packed attribute stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexStream {
    pub semantic: Semantic,
    pub layout: VertexLayout,
    pub bytes: Vec<u8>,
}

impl VertexStream {
    pub fn new(semantic: Semantic, values: &AccessorValues) -> Self {
        let components = values.element_type.arity() as u32;
        let component_type = values.data.component_type();
        Self {
            semantic,
            layout: VertexLayout {
                location: semantic.location(),
                components,
                component_type,
                normalized: values.normalized,
                integer: semantic == Semantic::Joints0 && component_type.is_integer(),
                stride: components * component_type.byte_size() as u32,
                offset: 0,
            },
            bytes: values.data.to_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexStream {
    pub format: IndexFormat,
    pub count: u32,
    pub bytes: Vec<u8>,
}

impl IndexStream {
    /// Index stream from unsigned integer accessor data. Every index must
    /// address a vertex.
    pub fn from_accessor(data: &AccessorData, vertex_count: usize) -> ImportResult<Self> {
        let format = match data.component_type() {
            ComponentType::U8 => IndexFormat::U8,
            ComponentType::U16 => IndexFormat::U16,
            ComponentType::U32 => IndexFormat::U32,
            other => {
                return Err(ImportError::Schema(format!(
                    "index data must be an unsigned integer type, found {other:?}"
                )));
            }
        };
        let indices = data.to_u32()?;
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ImportError::Range(format!(
                "index {bad} addresses past {vertex_count} vertices"
            )));
        }
        Ok(Self {
            format,
            count: indices.len() as u32,
            bytes: data.to_bytes(),
        })
    }

    /// `0..vertex_count`, for primitives drawn without an index accessor.
    pub fn sequential(vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize + 1 {
            let indices: Vec<u16> = (0..vertex_count).map(|i| i as u16).collect();
            Self {
                format: IndexFormat::U16,
                count: vertex_count as u32,
                bytes: bytemuck::cast_slice(&indices).to_vec(),
            }
        } else {
            let indices: Vec<u32> = (0..vertex_count as u32).collect();
            Self {
                format: IndexFormat::U32,
                count: vertex_count as u32,
                bytes: bytemuck::cast_slice(&indices).to_vec(),
            }
        }
    }
}

/// Primitive as read from the document, before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveData {
    pub mode: PrimitiveMode,
    pub vertex_count: usize,
    pub streams: Vec<VertexStream>,
    pub indices: IndexStream,
}

impl PrimitiveData {
    pub fn stream(&self, semantic: Semantic) -> Option<&VertexStream> {
        self.streams.iter().find(|s| s.semantic == semantic)
    }

    pub fn upload(&self, backend: &mut dyn RenderBackend) -> Primitive {
        let vertex_buffers = self
            .streams
            .iter()
            .map(|stream| backend.create_vertex_buffer(&stream.bytes, &stream.layout))
            .collect();
        let index_buffer = backend.create_index_buffer(&self.indices.bytes, self.indices.format);
        Primitive {
            mode: self.mode,
            vertex_buffers,
            index_buffer,
            index_format: self.indices.format,
            element_count: self.indices.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveData>,
}

impl MeshData {
    pub fn upload(&self, backend: &mut dyn RenderBackend) -> Mesh {
        Mesh {
            name: self.name.clone(),
            primitives: self.primitives.iter().map(|p| p.upload(backend)).collect(),
        }
    }
}

/// Uploaded primitive. Vertex buffers are in [`Semantic::location`] order
/// of the streams present.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub mode: PrimitiveMode,
    pub vertex_buffers: Vec<VertexBufferHandle>,
    pub index_buffer: IndexBufferHandle,
    pub index_format: IndexFormat,
    pub element_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}
