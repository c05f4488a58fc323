//! CPU-side mesh representation produced by the OBJ parser.

/// Index counts above this need 32-bit indices.
pub const WIDE_INDEX_THRESHOLD: usize = 65_536;

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];
    pub const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

impl Default for MeshVertex {
    fn default() -> Self {
        Self::new([0.0; 3], Self::DEFAULT_NORMAL, Self::DEFAULT_UV)
    }
}

/// Storage width of one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexWidth {
    /// 16 bits per index.
    Narrow,
    /// 32 bits per index.
    Wide,
}

impl IndexWidth {
    /// Smallest width that can address `index_count` indices.
    pub fn for_index_count(index_count: usize) -> Self {
        if index_count > WIDE_INDEX_THRESHOLD {
            IndexWidth::Wide
        } else {
            IndexWidth::Narrow
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            IndexWidth::Narrow => 2,
            IndexWidth::Wide => 4,
        }
    }
}

/// Triangle-list indices in the width chosen at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexData {
    Narrow(Vec<u16>),
    Wide(Vec<u32>),
}

impl IndexData {
    /// Pack ordinals into the width [`IndexWidth::for_index_count`] selects.
    ///
    /// Every ordinal is below the index count (a vertex is only emitted by
    /// the corner that first references it), so narrow packing never
    /// truncates.
    pub fn from_ordinals(ordinals: Vec<u32>) -> Self {
        match IndexWidth::for_index_count(ordinals.len()) {
            IndexWidth::Wide => IndexData::Wide(ordinals),
            IndexWidth::Narrow => {
                IndexData::Narrow(ordinals.into_iter().map(|i| i as u16).collect())
            }
        }
    }

    pub fn width(&self) -> IndexWidth {
        match self {
            IndexData::Narrow(_) => IndexWidth::Narrow,
            IndexData::Wide(_) => IndexWidth::Wide,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::Narrow(v) => v.len(),
            IndexData::Wide(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate indices widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            IndexData::Narrow(v) => Box::new(v.iter().map(|&i| u32::from(i))),
            IndexData::Wide(v) => Box::new(v.iter().copied()),
        }
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl Default for IndexData {
    fn default() -> Self {
        IndexData::Narrow(Vec::new())
    }
}

/// Indexed triangle mesh with deduplicated vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<MeshVertex>,
    pub indices: IndexData,
}

impl MeshBuffers {
    pub fn new(vertices: Vec<MeshVertex>, indices: IndexData) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn index_width(&self) -> IndexWidth {
        self.indices.width()
    }

    /// Position channel, tightly packed.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Normal channel, tightly packed.
    pub fn normals(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.normal).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshBuffers::new(vec![MeshVertex::default()], IndexData::Narrow(vec![0]));
        assert!(data.is_valid());
        assert!(!MeshBuffers::default().is_valid());
    }

    #[test]
    fn width_switches_above_threshold() {
        assert_eq!(IndexWidth::for_index_count(0), IndexWidth::Narrow);
        assert_eq!(
            IndexWidth::for_index_count(WIDE_INDEX_THRESHOLD),
            IndexWidth::Narrow
        );
        assert_eq!(
            IndexWidth::for_index_count(WIDE_INDEX_THRESHOLD + 1),
            IndexWidth::Wide
        );
    }

    #[test]
    fn narrow_packing_keeps_values() {
        let ordinals: Vec<u32> = (0..WIDE_INDEX_THRESHOLD as u32).collect();
        let data = IndexData::from_ordinals(ordinals.clone());
        assert_eq!(data.width(), IndexWidth::Narrow);
        assert_eq!(data.to_vec(), ordinals);
    }

    #[test]
    fn default_vertex_attributes() {
        let v = MeshVertex::default();
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.uv, [0.0, 0.0]);
    }
}
