/// Mesh data and its device-local buffers
///
/// A mesh arrives from asset loading as flat per-vertex attribute arrays plus
/// a flat index array. Each array is uploaded into its own device-local
/// buffer through the staged upload path.

use std::sync::Arc;
use glam::{Vec2, Vec3, Vec4};

use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferUsage, GraphicsDevice};

/// CPU-side mesh, one entry per vertex in every attribute array
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    /// xyz = tangent, w = bitangent sign
    pub tangents: Vec<Vec4>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Check that the mesh can be uploaded and drawn
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertex_count();
        if vertex_count == 0 {
            return Err(Error::InvalidResource("Mesh has no vertices".to_string()));
        }
        if self.indices.is_empty() {
            return Err(Error::InvalidResource("Mesh has no indices".to_string()));
        }

        for (name, len) in [
            ("tex_coords", self.tex_coords.len()),
            ("normals", self.normals.len()),
            ("tangents", self.tangents.len()),
        ] {
            if len != vertex_count {
                return Err(Error::InvalidResource(format!(
                    "Mesh attribute '{}' has {} entries, expected {}",
                    name, len, vertex_count
                )));
            }
        }

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::InvalidResource(format!(
                "Mesh index {} out of range ({} vertices)",
                index, vertex_count
            )));
        }

        Ok(())
    }
}

/// Device-local buffers of an uploaded mesh
pub struct MeshBuffers {
    pub positions: Arc<dyn Buffer>,
    pub tex_coords: Arc<dyn Buffer>,
    pub normals: Arc<dyn Buffer>,
    pub tangents: Arc<dyn Buffer>,
    pub indices: Arc<dyn Buffer>,
    pub index_count: u32,
}

impl MeshBuffers {
    /// Validate `mesh` and upload every array, one synchronous transfer each
    pub fn upload(device: &mut dyn GraphicsDevice, mesh: &MeshData) -> Result<Self> {
        mesh.validate()?;

        let index_count = u32::try_from(mesh.index_count()).map_err(|_| {
            Error::InvalidResource(format!("Mesh has too many indices ({})", mesh.index_count()))
        })?;

        let positions = device.upload_buffer(BufferUsage::Vertex, bytemuck::cast_slice(&mesh.positions))?;
        let tex_coords = device.upload_buffer(BufferUsage::Vertex, bytemuck::cast_slice(&mesh.tex_coords))?;
        let normals = device.upload_buffer(BufferUsage::Vertex, bytemuck::cast_slice(&mesh.normals))?;
        let tangents = device.upload_buffer(BufferUsage::Vertex, bytemuck::cast_slice(&mesh.tangents))?;
        let indices = device.upload_buffer(BufferUsage::Index, bytemuck::cast_slice(&mesh.indices))?;

        crate::engine_debug!(
            "orrery::resource::mesh",
            "Uploaded mesh ({} vertices, {} indices)",
            mesh.vertex_count(),
            index_count
        );

        Ok(Self {
            positions,
            tex_coords,
            normals,
            tangents,
            indices,
            index_count,
        })
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
