use std::ops::Deref;

use nalgebra::{DMatrix, DVector, Vector2};

use crate::error::ConfigurationError;
use crate::linkage::{Pose, Rod};

/// Linear operator from a flat joint vector `[x0, y0, x1, y1, ...]` to stacked
/// rod displacement vectors.
///
/// Shape is `2M x 2N`. Rod `i` owns rows `2i` (x) and `2i + 1` (y), with `+1`
/// at its first joint's columns and `-1` at its second joint's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityMatrix {
    matrix: DMatrix<f64>,
}

impl ConnectivityMatrix {
    /// Build the operator for `joint_count` joints and the given rods.
    pub fn build(joint_count: usize, rods: &[Rod]) -> Result<Self, ConfigurationError> {
        let mut matrix = DMatrix::zeros(2 * rods.len(), 2 * joint_count);

        for (i, rod) in rods.iter().enumerate() {
            for joint in [rod.a, rod.b] {
                if joint >= joint_count {
                    return Err(ConfigurationError::JointOutOfRange {
                        rod: i,
                        joint,
                        joint_count,
                    });
                }
            }
            if rod.a == rod.b {
                return Err(ConfigurationError::SelfLoop { rod: i, joint: rod.a });
            }

            matrix[(2 * i, 2 * rod.a)] = 1.0;
            matrix[(2 * i, 2 * rod.b)] = -1.0;
            matrix[(2 * i + 1, 2 * rod.a + 1)] = 1.0;
            matrix[(2 * i + 1, 2 * rod.b + 1)] = -1.0;
        }

        Ok(Self { matrix })
    }

    pub fn rod_count(&self) -> usize {
        self.matrix.nrows() / 2
    }

    pub fn joint_count(&self) -> usize {
        self.matrix.ncols() / 2
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Stacked displacement vectors for a flat joint vector.
    ///
    /// # Panics
    ///
    /// Panics if `flat` does not hold two coordinates per joint.
    pub fn apply(&self, flat: &DVector<f64>) -> DVector<f64> {
        &self.matrix * flat
    }

    /// Per-rod displacement (first joint minus second joint).
    pub fn rod_vectors(&self, flat: &DVector<f64>) -> Vec<Vector2<f64>> {
        let stacked = self.apply(flat);
        stacked
            .as_slice()
            .chunks_exact(2)
            .map(|d| Vector2::new(d[0], d[1]))
            .collect()
    }

    /// Per-rod Euclidean lengths for a flat joint vector.
    pub fn lengths(&self, flat: &DVector<f64>) -> Vec<f64> {
        self.rod_vectors(flat).iter().map(|d| d.norm()).collect()
    }

    pub fn pose_lengths(&self, pose: &Pose) -> Vec<f64> {
        self.lengths(&pose.to_flat())
    }
}

/// Target length of every rod, indexed like the rods.
#[derive(Debug, Clone, PartialEq)]
pub struct RestLengths(Vec<f64>);

impl RestLengths {
    /// Measure every rod in `layout`.
    pub fn capture(connectivity: &ConnectivityMatrix, layout: &Pose) -> Self {
        Self(connectivity.pose_lengths(layout))
    }

    /// Wrap externally supplied targets, e.g. to compare a pose against altered lengths.
    pub fn from_vec(lengths: Vec<f64>) -> Self {
        Self(lengths)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for RestLengths {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    #[test]
    fn test_matrix_layout() {
        let rods = [Rod::new(0, 2), Rod::new(2, 1)];
        let c = ConnectivityMatrix::build(3, &rods).unwrap();
        let m = c.as_matrix();
        assert_eq!(m.shape(), (4, 6));
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 4)], -1.0);
        assert_eq!(m[(1, 1)], 1.0);
        assert_eq!(m[(1, 5)], -1.0);
        assert_eq!(m[(2, 4)], 1.0);
        assert_eq!(m[(2, 2)], -1.0);
        assert_eq!(m[(3, 5)], 1.0);
        assert_eq!(m[(3, 3)], -1.0);
        // Every row is a pure difference.
        for row in m.row_iter() {
            assert_eq!(row.sum(), 0.0);
        }
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = ConnectivityMatrix::build(3, &[Rod::new(1, 1)]).unwrap_err();
        assert_eq!(err, ConfigurationError::SelfLoop { rod: 0, joint: 1 });
    }

    #[test]
    fn test_rest_lengths_order_stable() {
        let layout = Pose::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 4.0),
            Point2::new(3.0, 0.0),
        ]);
        let rods = [Rod::new(0, 1), Rod::new(1, 2), Rod::new(2, 0)];
        let c = ConnectivityMatrix::build(3, &rods).unwrap();
        let rest = RestLengths::capture(&c, &layout);
        assert_relative_eq!(rest[0], 5.0);
        assert_relative_eq!(rest[1], 4.0);
        assert_relative_eq!(rest[2], 3.0);
    }

    #[test]
    fn test_rod_vectors_sign() {
        let layout = Pose::new(vec![Point2::new(1.0, 1.0), Point2::new(4.0, 5.0)]);
        let c = ConnectivityMatrix::build(2, &[Rod::new(0, 1)]).unwrap();
        let d = c.rod_vectors(&layout.to_flat());
        assert_relative_eq!(d[0].x, -3.0);
        assert_relative_eq!(d[0].y, -4.0);
    }
}
