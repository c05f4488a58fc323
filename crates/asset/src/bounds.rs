//! Axis-aligned bounds over emitted vertex positions.

use crate::mesh::MeshBuffers;

/// Bounding box of a point set. Derived once per mesh load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub center: [f32; 3],
    pub size: [f32; 3],
    point_count: usize,
}

impl BoundingBox {
    /// Zero-sized box around the origin, used for empty meshes.
    pub const EMPTY: Self = Self {
        min: [0.0; 3],
        max: [0.0; 3],
        center: [0.0; 3],
        size: [0.0; 3],
        point_count: 0,
    };

    /// Single pass over `positions`.
    ///
    /// A NaN or infinite coordinate anywhere poisons the whole box, since
    /// `f32::min`/`f32::max` would otherwise skip NaN silently.
    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        let mut finite = true;
        let mut point_count = 0;

        for p in positions {
            point_count += 1;
            for axis in 0..3 {
                let c = p[axis];
                finite &= c.is_finite();
                min[axis] = min[axis].min(c);
                max[axis] = max[axis].max(c);
            }
        }

        if point_count == 0 {
            return Self::EMPTY;
        }
        if !finite {
            let nan = [f32::NAN; 3];
            return Self {
                min: nan,
                max: nan,
                center: nan,
                size: nan,
                point_count,
            };
        }

        let size = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
        let center = [
            (max[0] + min[0]) / 2.0,
            (max[1] + min[1]) / 2.0,
            (max[2] + min[2]) / 2.0,
        ];
        Self {
            min,
            max,
            center,
            size,
            point_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// `false` if any input coordinate was NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.min
            .iter()
            .chain(&self.max)
            .chain(&self.size)
            .all(|c| c.is_finite())
    }

    /// Largest edge length.
    pub fn max_extent(&self) -> f32 {
        self.size[0].max(self.size[1]).max(self.size[2])
    }
}

/// Bounding box of a mesh's emitted vertices.
pub fn analyze(mesh: &MeshBuffers) -> BoundingBox {
    BoundingBox::from_positions(mesh.vertices.iter().map(|v| v.position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::parse_obj;

    #[test]
    fn triangle_bounds() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").mesh;
        let bb = analyze(&mesh);
        assert_eq!(bb.min, [0.0, 0.0, 0.0]);
        assert_eq!(bb.max, [1.0, 1.0, 0.0]);
        assert_eq!(bb.center, [0.5, 0.5, 0.0]);
        assert_eq!(bb.size, [1.0, 1.0, 0.0]);
        assert_eq!(bb.max_extent(), 1.0);
        assert!(bb.is_finite());
        assert!(!bb.is_empty());
    }

    #[test]
    fn empty_input_is_zero_box() {
        let bb = BoundingBox::from_positions(std::iter::empty());
        assert!(bb.is_empty());
        assert!(bb.is_finite());
        assert_eq!(bb.max_extent(), 0.0);
    }

    #[test]
    fn nan_poisons_box_even_when_not_first() {
        let bb = BoundingBox::from_positions([[0.0, 0.0, 0.0], [1.0, f32::NAN, 2.0], [3.0, 3.0, 3.0]]);
        assert!(!bb.is_finite());
        assert!(bb.max_extent().is_nan());
    }

    #[test]
    fn negative_coordinates() {
        let bb = BoundingBox::from_positions([[-2.0, -1.0, 4.0], [2.0, 3.0, -4.0]]);
        assert_eq!(bb.min, [-2.0, -1.0, -4.0]);
        assert_eq!(bb.max, [2.0, 3.0, 4.0]);
        assert_eq!(bb.center, [0.0, 1.0, 0.0]);
        assert_eq!(bb.max_extent(), 8.0);
    }
}
