//! Binary buffer packing: appends typed data and records matching
//! bufferViews and accessors.

use serde_json::{Value, json};

pub const FLOAT: u32 = 5126;
pub const UNSIGNED_BYTE: u32 = 5121;
pub const UNSIGNED_SHORT: u32 = 5123;

#[derive(Debug, Default)]
pub struct BufferBuilder {
    pub data: Vec<u8>,
    pub buffer_views: Vec<Value>,
    pub accessors: Vec<Value>,
}

impl BufferBuilder {
    /// Append float elements; returns the accessor index.
    pub fn push_f32(&mut self, values: &[f32], element_type: &str, arity: usize) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let count = values.len() / arity;
        let accessor = self.push_view(&bytes, FLOAT, count, element_type);

        if element_type == "SCALAR" {
            let min = values.iter().copied().fold(f32::INFINITY, f32::min);
            let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            self.accessors[accessor]["min"] = json!([min]);
            self.accessors[accessor]["max"] = json!([max]);
        }
        accessor
    }

    pub fn push_u8(&mut self, values: &[u8], element_type: &str, arity: usize) -> usize {
        self.push_view(values, UNSIGNED_BYTE, values.len() / arity, element_type)
    }

    pub fn push_u16(&mut self, values: &[u16], element_type: &str, arity: usize) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_view(&bytes, UNSIGNED_SHORT, values.len() / arity, element_type)
    }

    fn push_view(&mut self, bytes: &[u8], component_type: u32, count: usize, element_type: &str) -> usize {
        // keep every view 4-byte aligned
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);

        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len()
        }));
        self.accessors.push(json!({
            "bufferView": self.buffer_views.len() - 1,
            "componentType": component_type,
            "count": count,
            "type": element_type
        }));
        self.accessors.len() - 1
    }
}
