use vista_mesh::{Aabb, TerrainMesh};
use vista_terrain::ChunkCoord;

/// One generated terrain chunk, owned by the streamer until retired.
#[derive(Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    mesh: TerrainMesh,
    visible: bool,
}

impl TerrainChunk {
    pub(crate) fn new(coord: ChunkCoord, mesh: TerrainMesh) -> Self {
        Self {
            coord,
            mesh,
            visible: true,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Vertex and index data, ready for upload.
    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    /// World-space bounds of the mesh.
    pub fn bounds(&self) -> &Aabb {
        &self.mesh.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Give up the mesh, e.g. to move it into a GPU upload queue on disposal.
    pub fn into_mesh(self) -> TerrainMesh {
        self.mesh
    }
}
