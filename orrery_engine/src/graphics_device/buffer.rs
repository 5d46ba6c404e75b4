/// Buffer trait and buffer usage

/// Final usage of an uploaded buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform/constant buffer
    Uniform,
    /// Storage buffer
    Storage,
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., the Vulkan buffer).
/// The buffer and its memory are released when dropped.
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage the buffer was created for
    fn usage(&self) -> BufferUsage;
}
