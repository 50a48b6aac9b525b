//! Buffer resolver
//!
//! Produces the raw payload of every `buffers[i]` entry: inline base64 data
//! URIs, files relative to a resource root, or the GLB binary chunk.

use std::path::{Component, Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::document::Buffer;
use crate::error::{ImportError, ImportResult};

const DATA_URI_MEDIA_TYPES: [&str; 2] = ["application/octet-stream", "application/gltf-buffer"];

/// Resolves buffer descriptors for one import.
#[derive(Debug, Clone)]
pub struct BufferResolver<'a> {
    resource_root: &'a Path,
    allow_external_paths: bool,
    binary_chunk: Option<&'a [u8]>,
}

impl<'a> BufferResolver<'a> {
    pub fn new(resource_root: &'a Path) -> Self {
        Self {
            resource_root,
            allow_external_paths: false,
            binary_chunk: None,
        }
    }

    /// Permit absolute paths and `..` components in buffer URIs.
    pub fn allow_external_paths(mut self, allow: bool) -> Self {
        self.allow_external_paths = allow;
        self
    }

    pub fn with_binary_chunk(mut self, chunk: Option<&'a [u8]>) -> Self {
        self.binary_chunk = chunk;
        self
    }

    /// Resolve every buffer of a document, in order.
    pub fn resolve_all(&self, buffers: &[Buffer]) -> ImportResult<Vec<Vec<u8>>> {
        buffers
            .iter()
            .enumerate()
            .map(|(index, buffer)| self.resolve(index, buffer))
            .collect()
    }

    /// Resolve one buffer to exactly `byte_length` bytes.
    pub fn resolve(&self, index: usize, buffer: &Buffer) -> ImportResult<Vec<u8>> {
        let mut bytes = match buffer.uri.as_deref() {
            Some(uri) if uri.starts_with("data:") => {
                let bytes = decode_data_uri(uri)?;
                if bytes.len() != buffer.byte_length {
                    return Err(ImportError::Decode(format!(
                        "buffer {index}: data URI holds {} bytes, byteLength is {}",
                        bytes.len(),
                        buffer.byte_length
                    )));
                }
                return Ok(bytes);
            }
            Some(uri) => {
                let path = self.external_path(uri)?;
                std::fs::read(&path).map_err(|source| ImportError::Io { path, source })?
            }
            None => {
                let chunk = match (index, self.binary_chunk) {
                    (0, Some(chunk)) => chunk,
                    _ => {
                        return Err(ImportError::Schema(format!(
                            "buffer {index} has no uri and no GLB binary chunk backs it"
                        )));
                    }
                };
                chunk.to_vec()
            }
        };

        if bytes.len() < buffer.byte_length {
            return Err(ImportError::Range(format!(
                "buffer {index}: {} bytes available, byteLength is {}",
                bytes.len(),
                buffer.byte_length
            )));
        }
        bytes.truncate(buffer.byte_length);
        Ok(bytes)
    }

    fn external_path(&self, uri: &str) -> ImportResult<PathBuf> {
        let relative = PathBuf::from(percent_decode(uri));
        let escapes_root = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes_root && !self.allow_external_paths {
            return Err(ImportError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "buffer uri escapes the resource root",
                ),
                path: relative,
            });
        }
        Ok(self.resource_root.join(relative))
    }
}

/// Decode a `data:<media type>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> ImportResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImportError::Decode("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImportError::Decode("data URI has no payload separator".to_string()))?;
    let media_type = header.strip_suffix(";base64").ok_or_else(|| {
        ImportError::Decode(format!("data URI '{header}' is not base64 encoded"))
    })?;
    if !DATA_URI_MEDIA_TYPES.contains(&media_type) {
        return Err(ImportError::Decode(format!(
            "unsupported data URI media type '{media_type}'"
        )));
    }
    BASE64
        .decode(payload)
        .map_err(|err| ImportError::Decode(format!("invalid base64 payload: {err}")))
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = match bytes[i] {
            b'%' => bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok()),
            _ => None,
        };
        match escaped {
            Some(value) => {
                out.push(value);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
