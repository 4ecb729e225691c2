//! The `SimulationCell` type represents the enclosing box of a particle
//! system, with independent periodic boundary conditions along each cell
//! vector.
use std::f64;
use crate::{Matrix3, Vector3D};
use crate::neighbors::CellShift;

/// Relative tolerance on the cell volume used to decide if a cell is
/// degenerate, compared to the product of the cell vectors lengths.
const DEGENERATE_VOLUME_TOLERANCE: f64 = 1e-9;

/// The shape of a cell determine how we will be able to compute the periodic
/// boundaries condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    /// Infinite cell, with all cell vectors set to zero and no periodicity
    Infinite,
    /// Orthorhombic cell, with cuboid shape
    Orthorhombic,
    /// Triclinic cell, with arbitrary parallelepiped shape
    Triclinic,
}

/// A `SimulationCell` defines the system physical boundaries.
///
/// The cell is a parallelepiped spanned by the three cell vectors (the rows of
/// the cell matrix), starting at `origin`. Each of the three cell vectors can
/// independently be periodic or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationCell {
    /// Cell matrix, with one cell vector per row
    matrix: Matrix3,
    /// Transpose of the cell matrix, cached from matrix
    transpose: Matrix3,
    /// Inverse of the transpose of the cell matrix, cached from matrix. This
    /// is set to zero for degenerate cells.
    inverse: Matrix3,
    /// Position of the first corner of the cell
    origin: Vector3D,
    /// Periodic boundary conditions along each cell vector
    pbc: [bool; 3],
    /// Cell shape
    shape: CellShape,
}

impl From<Matrix3> for SimulationCell {
    fn from(matrix: Matrix3) -> SimulationCell {
        SimulationCell::new(matrix)
    }
}

impl SimulationCell {
    /// Create a new fully periodic cell using the rows of `matrix` as cell
    /// vectors, with the origin at zero.
    ///
    /// Degenerate matrices are accepted here, but such cells can not be used
    /// to build a neighbor finder while any of the periodic flags is set.
    pub fn new(matrix: Matrix3) -> SimulationCell {
        let is_close_0 = |value| f64::abs(value) < 1e-6;
        let is_diagonal = |matrix: Matrix3| {
            is_close_0(matrix[0][1]) && is_close_0(matrix[0][2]) &&
            is_close_0(matrix[1][0]) && is_close_0(matrix[1][2]) &&
            is_close_0(matrix[2][0]) && is_close_0(matrix[2][1])
        };

        let shape = if matrix == Matrix3::zero() {
            CellShape::Infinite
        } else if is_diagonal(matrix) {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };

        let pbc = if shape == CellShape::Infinite {
            [false; 3]
        } else {
            [true; 3]
        };

        let mut cell = SimulationCell {
            matrix: matrix,
            transpose: matrix.transposed(),
            inverse: Matrix3::zero(),
            origin: Vector3D::zero(),
            pbc: pbc,
            shape: shape,
        };

        if !cell.is_degenerate() {
            cell.inverse = cell.transpose.inverse();
        }

        return cell;
    }

    /// Create an infinite cell, without any periodic boundary condition
    pub fn infinite() -> SimulationCell {
        SimulationCell::new(Matrix3::zero())
    }

    /// Create an orthorhombic cell, with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> SimulationCell {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "Cell lengths must be positive");
        SimulationCell::new(Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c]
        ]))
    }

    /// Create a cubic cell, with side lengths `length, length, length`.
    pub fn cubic(length: f64) -> SimulationCell {
        SimulationCell::orthorhombic(length, length, length)
    }

    /// Create a triclinic cell, with side lengths `a, b, c` and angles
    /// `alpha, beta, gamma` (in degrees).
    pub fn triclinic(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> SimulationCell {
        assert!(a > 0.0 && b > 0.0 && c > 0.0, "Cell lengths must be positive");
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let b_x = b * cos_gamma;
        let b_y = b * sin_gamma;

        let c_x = c * cos_beta;
        let c_y = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c_z2 = c * c - c_y * c_y - c_x * c_x;
        assert!(
            c_z2 > 0.0,
            "Cell angles ({}, {}, {}) do not describe a valid cell", alpha, beta, gamma
        );
        let c_z = f64::sqrt(c_z2);

        return SimulationCell::new(Matrix3::new([
            [a,   0.0, 0.0],
            [b_x, b_y, 0.0],
            [c_x, c_y, c_z],
        ]));
    }

    /// Set the position of the first corner of the cell
    #[must_use]
    pub fn with_origin(mut self, origin: Vector3D) -> SimulationCell {
        self.origin = origin;
        self
    }

    /// Set the periodic boundary conditions flags along each cell vector
    #[must_use]
    pub fn with_pbc(mut self, pbc: [bool; 3]) -> SimulationCell {
        self.pbc = pbc;
        self
    }

    /// Get the cell shape
    pub fn shape(&self) -> CellShape {
        self.shape
    }

    /// Get the matricial representation of the cell, with one cell vector
    /// per row
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the position of the first corner of the cell
    pub fn origin(&self) -> Vector3D {
        self.origin
    }

    /// Get the periodic boundary conditions flags
    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    /// Check if this cell is periodic along at least one of its vectors
    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&periodic| periodic)
    }

    /// Check if this cell is infinite, *i.e.* if all cell vectors are zero
    pub fn is_infinite(&self) -> bool {
        self.shape == CellShape::Infinite
    }

    /// Check if all the entries of the cell matrix and the origin are finite
    pub fn is_finite(&self) -> bool {
        let matrix = (0..3).all(|i| self.matrix[i].iter().all(|value| value.is_finite()));
        let origin = self.origin.as_array().iter().all(|value| value.is_finite());
        return matrix && origin;
    }

    /// Check if this cell has a zero volume, in which case periodic images are
    /// not defined. A cell matrix containing infinite or NaN values is also
    /// considered degenerate.
    pub fn is_degenerate(&self) -> bool {
        let determinant = self.matrix.determinant();
        if !determinant.is_finite() {
            return true;
        }

        let lengths = self.a_vector().norm() * self.b_vector().norm() * self.c_vector().norm();
        if lengths == 0.0 {
            return true;
        }

        if !lengths.is_finite() {
            return true;
        }

        return f64::abs(determinant) <= DEGENERATE_VOLUME_TOLERANCE * lengths;
    }

    /// Get the volume of the cell
    pub fn volume(&self) -> f64 {
        match self.shape {
            CellShape::Infinite => 0.0,
            CellShape::Orthorhombic => f64::abs(self.matrix[0][0] * self.matrix[1][1] * self.matrix[2][2]),
            // The volume is the mixed product of the three cell vectors
            CellShape::Triclinic => f64::abs(self.a_vector() * (self.b_vector() ^ self.c_vector())),
        }
    }

    /// Get the distances between opposite faces of the cell, *i.e.* the
    /// width of the cell perpendicular to each pair of faces.
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.shape == CellShape::Infinite {
            return Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }

        if self.is_degenerate() {
            return Vector3D::zero();
        }

        let (a, b, c) = (self.a_vector(), self.b_vector(), self.c_vector());
        // Plans normal vectors
        let na = (b ^ c).normalized();
        let nb = (c ^ a).normalized();
        let nc = (a ^ b).normalized();

        Vector3D::new(f64::abs(na * a), f64::abs(nb * b), f64::abs(nc * c))
    }

    /// Get the first vector of the cell
    fn a_vector(&self) -> Vector3D {
        self.matrix[0].into()
    }

    /// Get the second vector of the cell
    fn b_vector(&self) -> Vector3D {
        self.matrix[1].into()
    }

    /// Get the third vector of the cell
    fn c_vector(&self) -> Vector3D {
        self.matrix[2].into()
    }
}

/// Geometric operations using periodic boundary conditions. These functions
/// only make sense for non-degenerate cells.
impl SimulationCell {
    /// Get the fractional coordinates of the point at `position`, relative to
    /// the cell origin.
    pub fn fractional(&self, position: Vector3D) -> Vector3D {
        // this needs to use the inverse of the transpose of the matrix, since
        // we only have code to multiply a vector by a matrix on the left
        return self.inverse * (position - self.origin);
    }

    /// Get the Cartesian position corresponding to the `fractional`
    /// coordinates in this cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.transpose * fractional + self.origin;
    }

    /// Get the cartesian vector corresponding to a displacement of `shift`
    /// cells along the cell vectors
    pub fn shift_vector(&self, shift: CellShift) -> Vector3D {
        return shift.cartesian(&self.matrix);
    }

    /// Wrap the point at `position` inside the cell, along the periodic
    /// directions only. For a cubic periodic cell of side length `L` starting
    /// at the origin, this produce a point with all components in `[0, L)`.
    pub fn wrap_point(&self, position: Vector3D) -> Vector3D {
        let fractional = self.fractional(position);
        let mut shift = Vector3D::zero();
        for k in 0..3 {
            if self.pbc[k] {
                shift[k] = f64::floor(fractional[k]);
            }
        }
        return position - self.transpose * shift;
    }

    /// Find the minimal image of a vector, obeying the periodic boundary
    /// conditions. For a cubic periodic cell of side length `L`, this produce
    /// a vector with all components in `[-L/2, L/2]`.
    pub fn vector_image(&self, vector: &mut Vector3D) {
        match self.shape {
            CellShape::Infinite => (),
            CellShape::Orthorhombic => {
                for k in 0..3 {
                    if self.pbc[k] {
                        let length = self.matrix[k][k];
                        vector[k] -= f64::round(vector[k] / length) * length;
                    }
                }
            }
            CellShape::Triclinic => {
                let fractional = self.inverse * *vector;
                let mut shift = Vector3D::zero();
                for k in 0..3 {
                    if self.pbc[k] {
                        shift[k] = f64::round(fractional[k]);
                    }
                }
                *vector -= self.transpose * shift;
            }
        }
    }

    /// Periodic boundary conditions squared distance between the point `u` and
    /// the point `v`
    pub fn distance2(&self, u: Vector3D, v: Vector3D) -> f64 {
        let mut d = v - u;
        self.vector_image(&mut d);
        return d.norm2();
    }

    /// Periodic boundary conditions distance between the point `u` and
    /// the point `v`
    pub fn distance(&self, u: Vector3D, v: Vector3D) -> f64 {
        return f64::sqrt(self.distance2(u, v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64;

    use approx::{assert_ulps_eq, assert_relative_eq};

    #[test]
    #[should_panic(expected = "Cell lengths must be positive")]
    fn negative_cubic() {
        let _ = SimulationCell::cubic(-4.0);
    }

    #[test]
    #[should_panic(expected = "Cell lengths must be positive")]
    fn negative_ortho() {
        let _ = SimulationCell::orthorhombic(3.0, 0.0, -5.0);
    }

    #[test]
    fn infinite() {
        let cell = SimulationCell::infinite();
        assert_eq!(cell.shape(), CellShape::Infinite);
        assert!(cell.is_infinite());
        assert!(cell.is_degenerate());
        assert!(!cell.is_periodic());
        assert_eq!(cell.pbc(), [false, false, false]);

        assert_eq!(cell.volume(), 0.0);
        assert_eq!(cell.distances_between_faces()[0], f64::INFINITY);
    }

    #[test]
    fn cubic() {
        let cell = SimulationCell::cubic(3.0);
        assert_eq!(cell.shape(), CellShape::Orthorhombic);
        assert!(!cell.is_infinite());
        assert!(!cell.is_degenerate());
        assert_eq!(cell.pbc(), [true, true, true]);

        assert_eq!(cell.a_vector(), Vector3D::new(3.0, 0.0, 0.0));
        assert_eq!(cell.b_vector(), Vector3D::new(0.0, 3.0, 0.0));
        assert_eq!(cell.c_vector(), Vector3D::new(0.0, 0.0, 3.0));

        assert_eq!(cell.volume(), 3.0 * 3.0 * 3.0);
    }

    #[test]
    fn triclinic() {
        let cell = SimulationCell::triclinic(3.0, 4.0, 5.0, 80.0, 90.0, 110.0);
        assert_eq!(cell.shape(), CellShape::Triclinic);
        assert!(!cell.is_degenerate());

        assert_eq!(cell.a_vector(), Vector3D::new(3.0, 0.0, 0.0));
        assert_eq!(cell.b_vector()[2], 0.0);

        assert_relative_eq!(cell.volume(), 55.410529, epsilon = 1e-6);
    }

    #[test]
    fn degenerate() {
        let flat = SimulationCell::new(Matrix3::new([
            [2.0, 0.0, 0.0],
            [0.0, 3.0, 0.0],
            [1.0, 1.0, 0.0],
        ]));
        assert!(flat.is_degenerate());
        assert_eq!(flat.volume(), 0.0);
        assert_eq!(flat.distances_between_faces(), Vector3D::zero());

        let missing_vector = SimulationCell::new(Matrix3::new([
            [2.0, 0.0, 0.0],
            [0.0, 3.0, 0.0],
            [0.0, 0.0, 0.0],
        ]));
        assert!(missing_vector.is_degenerate());

        // small cells are not degenerate
        assert!(!SimulationCell::cubic(1e-4).is_degenerate());

        // left-handed cells are fine
        let left_handed = SimulationCell::new(Matrix3::new([
            [0.0, 2.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 0.0, 2.0],
        ]));
        assert!(!left_handed.is_degenerate());
        assert_eq!(left_handed.volume(), 8.0);
    }

    #[test]
    fn non_finite() {
        let cell = SimulationCell::new(Matrix3::new([
            [10.0, 0.0, 0.0],
            [0.0, f64::NAN, 0.0],
            [0.0, 0.0, 10.0],
        ]));
        assert!(cell.is_degenerate());
        assert!(!cell.is_finite());

        let cell = SimulationCell::new(Matrix3::new([
            [f64::INFINITY, 0.0, 0.0],
            [0.0, 10.0, 0.0],
            [0.0, 0.0, 10.0],
        ]));
        assert!(cell.is_degenerate());
        assert!(!cell.is_finite());

        let cell = SimulationCell::cubic(10.0);
        assert!(cell.is_finite());
        assert!(!cell.with_origin(Vector3D::new(0.0, f64::NAN, 0.0)).is_finite());
        assert!(!cell.with_origin(Vector3D::new(f64::NEG_INFINITY, 0.0, 0.0)).is_finite());
    }

    #[test]
    #[should_panic(expected = "Cell angles (30, 150, 90) do not describe a valid cell")]
    fn impossible_triclinic() {
        let _ = SimulationCell::triclinic(3.0, 3.0, 3.0, 30.0, 150.0, 90.0);
    }

    #[test]
    fn shift_vector() {
        let cell = SimulationCell::new(Matrix3::new([
            [3.0, 0.0, 0.0],
            [1.0, 4.0, 0.0],
            [0.5, 0.5, 5.0],
        ]));
        assert_eq!(cell.shift_vector(CellShift::new([0, 0, 0])), Vector3D::zero());
        assert_eq!(cell.shift_vector(CellShift::new([1, 0, 0])), Vector3D::new(3.0, 0.0, 0.0));
        assert_eq!(cell.shift_vector(CellShift::new([1, -1, 2])), Vector3D::new(3.0, -3.0, 10.0));

        // the origin does not change shift vectors
        let shifted = cell.with_origin(Vector3D::new(-4.0, 2.0, 1.0));
        assert_eq!(shifted.shift_vector(CellShift::new([1, -1, 2])), Vector3D::new(3.0, -3.0, 10.0));
    }

    #[test]
    fn builders() {
        let cell = SimulationCell::cubic(3.0)
            .with_origin(Vector3D::new(1.0, -1.0, 0.5))
            .with_pbc([true, false, true]);

        assert_eq!(cell.origin(), Vector3D::new(1.0, -1.0, 0.5));
        assert_eq!(cell.pbc(), [true, false, true]);
        assert!(cell.is_periodic());

        let cell = cell.with_pbc([false; 3]);
        assert!(!cell.is_periodic());
    }

    #[test]
    fn distances_between_faces() {
        let ortho = SimulationCell::orthorhombic(3.0, 4.0, 5.0);
        assert_eq!(ortho.distances_between_faces(), Vector3D::new(3.0, 4.0, 5.0));

        let triclinic = SimulationCell::triclinic(3.0, 4.0, 5.0, 90.0, 80.0, 100.0);
        assert_ulps_eq!(
            triclinic.distances_between_faces(),
            Vector3D::new(2.908132319388713, 3.9373265973230853, 4.921658246653857),
            epsilon = 1e-12
        );
    }

    #[test]
    fn distances() {
        // Orthorhombic cell
        let cell = SimulationCell::orthorhombic(3.0, 4.0, 5.0);
        let u = Vector3D::zero();
        let v = Vector3D::new(1.0, 2.0, 6.0);
        assert_eq!(cell.distance(u, v), f64::sqrt(6.0));

        // the same cell, only periodic along the first vector
        let cell = cell.with_pbc([true, false, false]);
        assert_eq!(cell.distance(u, v), f64::sqrt(41.0));

        // Infinite cell
        let cell = SimulationCell::infinite();
        assert_eq!(cell.distance(u, v), v.norm());

        // Triclinic cell
        let u = Vector3D::new(7.86753, 10.4541, 13.0982);
        let v = Vector3D::new(9.13177, 3.87718, 6.55355);
        let cell = SimulationCell::new(Matrix3::new([
            [7.84788, 0.0,     7.84791],
            [7.84788, 7.84787, 0.0    ],
            [0.0,     7.84787, 7.84791],
        ]));
        assert_relative_eq!(cell.distance(u, v), 2.216326534538627, epsilon = 1e-12);
    }

    #[test]
    fn wrap_point() {
        // Cubic cell
        let cell = SimulationCell::cubic(10.0);
        let v = cell.wrap_point(Vector3D::new(9.0, 18.0, -6.0));
        assert_eq!(v, Vector3D::new(9.0, 8.0, 4.0));

        // Shifted origin
        let cell = cell.with_origin(Vector3D::new(-5.0, -5.0, -5.0));
        let v = cell.wrap_point(Vector3D::new(9.0, 18.0, -6.0));
        assert_eq!(v, Vector3D::new(-1.0, -2.0, 4.0));

        // Only wrap along periodic directions
        let cell = SimulationCell::orthorhombic(3.0, 4.0, 5.0).with_pbc([true, false, true]);
        let v = cell.wrap_point(Vector3D::new(4.0, 9.5, 6.0));
        assert_eq!(v, Vector3D::new(1.0, 9.5, 1.0));

        // Triclinic cell
        let cell = SimulationCell::triclinic(3.0, 4.0, 5.0, 90.0, 90.0, 90.0);
        let v = cell.wrap_point(Vector3D::new(1.0, 1.5, 6.0));
        assert_ulps_eq!(v, Vector3D::new(1.0, 1.5, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn vector_image() {
        // Cubic cell
        let cell = SimulationCell::cubic(10.0);
        let mut v = Vector3D::new(9.0, 18.0, -6.0);
        cell.vector_image(&mut v);
        assert_eq!(v, Vector3D::new(-1.0, -2.0, 4.0));

        // Orthorhombic cell
        let cell = SimulationCell::orthorhombic(3.0, 4.0, 5.0);
        let mut v = Vector3D::new(1.0, 1.5, 6.0);
        cell.vector_image(&mut v);
        assert_eq!(v, Vector3D::new(1.0, 1.5, 1.0));

        // Infinite cell
        let cell = SimulationCell::infinite();
        let mut v = Vector3D::new(1.0, 1.5, 6.0);
        cell.vector_image(&mut v);
        assert_eq!(v, Vector3D::new(1.0, 1.5, 6.0));

        // Triclinic cell
        let cell = SimulationCell::triclinic(3.0, 4.0, 5.0, 90.0, 90.0, 90.0);
        let mut v = Vector3D::new(1.0, 1.5, 6.0);
        cell.vector_image(&mut v);
        assert_ulps_eq!(v, Vector3D::new(1.0, 1.5, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn fractional_cartesian() {
        let cell = SimulationCell::cubic(5.0);

        assert_ulps_eq!(
            cell.fractional(Vector3D::new(0.0, 10.0, 4.0)),
            Vector3D::new(0.0, 2.0, 0.8)
        );
        assert_ulps_eq!(
            cell.cartesian(Vector3D::new(0.0, 2.0, 0.8)),
            Vector3D::new(0.0, 10.0, 4.0)
        );

        let cell = SimulationCell::triclinic(5.0, 6.0, 3.6, 90.0, 53.0, 77.0)
            .with_origin(Vector3D::new(-1.0, 2.0, 0.3));
        let tests = vec![
            Vector3D::new(0.0, 10.0, 4.0),
            Vector3D::new(-5.0, 12.0, 4.9),
        ];

        for test in tests {
            let transformed = cell.cartesian(cell.fractional(test));
            assert_ulps_eq!(test, transformed, epsilon = 1e-12);
        }
    }
}
