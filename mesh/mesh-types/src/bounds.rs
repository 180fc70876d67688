//! Bounding box of mesh vertex coordinates.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box spanned by a set of vertex coordinates.
///
/// `min` and `max` are the two rows of the classic `(2, dim)` mesh bounding
/// box. Planar meshes keep `z` at zero on both corners.
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let coors = [Point3::new(0.0, 2.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
/// let aabb = Aabb::from_points(coors.iter());
/// assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
/// assert_eq!(aabb.max_extent(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Componentwise minimum of the coordinates.
    pub min: Point3<f64>,
    /// Componentwise maximum of the coordinates.
    pub max: Point3<f64>,
}

impl Aabb {
    /// A box with inverted infinite corners, containing nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::from([f64::INFINITY; 3]),
            max: Point3::from([f64::NEG_INFINITY; 3]),
        }
    }

    /// Smallest box containing all points; [`Aabb::empty`] for no points.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        points.fold(Self::empty(), |aabb, p| Self {
            min: aabb.min.inf(p),
            max: aabb.max.sup(p),
        })
    }

    /// True when no point was ever included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Side lengths.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Midpoint of the two corners.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Largest side length, the mesh diameter estimate.
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        self.size().max()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_no_coordinates() {
        let aabb = Aabb::from_points(std::iter::empty());
        assert!(aabb.is_empty());
        assert_eq!(aabb, Aabb::default());
    }

    #[test]
    fn test_planar_coordinates() {
        let coors = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        let aabb = Aabb::from_points(coors.iter());
        assert!(!aabb.is_empty());
        assert_relative_eq!(aabb.max_extent(), 3.0);
        assert_relative_eq!(aabb.size().z, 0.0);
        assert_relative_eq!(aabb.center().x, 0.5);
        assert_eq!(aabb.max, Point3::new(2.0, 1.0, 0.0));
    }
}
