//! Rendering backend boundary
//!
//! The engine never touches a graphics API. It hands vertex and index bytes
//! to a [`RenderBackend`] once per primitive and submits per-frame draws to a
//! [`DrawSink`]. [`RecordingBackend`] implements both for headless use.

use glam::Mat4;

use crate::accessor::ComponentType;
use crate::document::PrimitiveMode;

/// Opaque vertex buffer handle issued by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferHandle(pub u32);

/// Opaque index buffer handle issued by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferHandle(pub u32);

/// How one vertex attribute stream is laid out for the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Shader input location
    pub location: u32,
    /// Components per vertex (1-4, 16 for matrices)
    pub components: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Bind as an integer attribute (joint indices)
    pub integer: bool,
    pub stride: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U8,
    U16,
    U32,
}

impl IndexFormat {
    pub fn byte_size(self) -> usize {
        match self {
            IndexFormat::U8 => 1,
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// Creates GPU-side buffers. Called on the tick thread when an asset
/// finishes importing.
pub trait RenderBackend {
    fn create_vertex_buffer(&mut self, bytes: &[u8], layout: &VertexLayout) -> VertexBufferHandle;

    fn create_index_buffer(&mut self, bytes: &[u8], format: IndexFormat) -> IndexBufferHandle;
}

/// One indexed draw of a primitive at a node's world transform.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub node: usize,
    pub skin: Option<usize>,
    pub vertex_buffers: &'a [VertexBufferHandle],
    pub index_buffer: IndexBufferHandle,
    pub index_format: IndexFormat,
    pub element_count: u32,
    pub mode: PrimitiveMode,
    pub transform: Mat4,
}

/// Receives draws in traversal order.
pub trait DrawSink {
    fn draw_indexed(&mut self, draw: &DrawCall<'_>);
}

/// Owned copy of a [`DrawCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub node: usize,
    pub skin: Option<usize>,
    pub vertex_buffers: Vec<VertexBufferHandle>,
    pub index_buffer: IndexBufferHandle,
    pub index_format: IndexFormat,
    pub element_count: u32,
    pub mode: PrimitiveMode,
    pub transform: Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVertexBuffer {
    pub bytes: Vec<u8>,
    pub layout: VertexLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedIndexBuffer {
    pub bytes: Vec<u8>,
    pub format: IndexFormat,
}

impl RecordedIndexBuffer {
    /// Number of indices in the upload.
    pub fn element_count(&self) -> usize {
        self.bytes.len() / self.format.byte_size()
    }
}

/// Headless backend that keeps every upload and draw in memory.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub vertex_buffers: Vec<RecordedVertexBuffer>,
    pub index_buffers: Vec<RecordedIndexBuffer>,
    pub draws: Vec<RecordedDraw>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the draws recorded since the last call.
    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }

    pub fn vertex_buffer(&self, handle: VertexBufferHandle) -> Option<&RecordedVertexBuffer> {
        self.vertex_buffers.get(handle.0 as usize)
    }

    pub fn index_buffer(&self, handle: IndexBufferHandle) -> Option<&RecordedIndexBuffer> {
        self.index_buffers.get(handle.0 as usize)
    }
}

impl RenderBackend for RecordingBackend {
    fn create_vertex_buffer(&mut self, bytes: &[u8], layout: &VertexLayout) -> VertexBufferHandle {
        let handle = VertexBufferHandle(self.vertex_buffers.len() as u32);
        self.vertex_buffers.push(RecordedVertexBuffer {
            bytes: bytes.to_vec(),
            layout: *layout,
        });
        handle
    }

    fn create_index_buffer(&mut self, bytes: &[u8], format: IndexFormat) -> IndexBufferHandle {
        let handle = IndexBufferHandle(self.index_buffers.len() as u32);
        self.index_buffers.push(RecordedIndexBuffer {
            bytes: bytes.to_vec(),
            format,
        });
        handle
    }
}

impl DrawSink for RecordingBackend {
    fn draw_indexed(&mut self, draw: &DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            node: draw.node,
            skin: draw.skin,
            vertex_buffers: draw.vertex_buffers.to_vec(),
            index_buffer: draw.index_buffer,
            index_format: draw.index_format,
            element_count: draw.element_count,
            mode: draw.mode,
            transform: draw.transform,
        });
    }
}
