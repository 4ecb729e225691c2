//! Neighbor search within a spherical cutoff, taking periodic boundary
//! conditions into account.
//!
//! The main entry point is [`CutoffNeighborFinder`], which sorts particles into
//! a grid of bins once, and can then be queried for the neighbors of any
//! particle. [`NeighborList`] uses a finder to pre-compute the full and half
//! neighbor lists of a whole system. [`NearestNeighborFinder`] looks for a
//! fixed number of nearest neighbors instead of using a cutoff.

use crate::{Matrix3, Vector3D};

mod grid;

mod parameters;
pub use self::parameters::FinderParameters;

mod finder;
pub use self::finder::{CutoffNeighborFinder, NeighborQuery};

mod nearest;
pub use self::nearest::NearestNeighborFinder;

mod list;
pub use self::list::NeighborList;

/// A cell shift represents the displacement along cell vectors between the
/// actual position of a particle and a periodic image of this particle.
///
/// The cell shift can be used to reconstruct the vector between two points,
/// as `position[second] - position[first] + shift.cartesian(cell)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellShift([i32; 3]);

impl CellShift {
    /// Create a new cell shift from its components
    pub const fn new(shift: [i32; 3]) -> CellShift {
        CellShift(shift)
    }

    /// Check if this shift is zero along all cell vectors
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0]
    }

    /// Compute the shift vector in cartesian coordinates, using the given cell
    /// matrix (stored in row major order).
    pub fn cartesian(&self, cell: &Matrix3) -> Vector3D {
        let x = cell[0][0] * self[0] as f64 + cell[1][0] * self[1] as f64 + cell[2][0] * self[2] as f64;
        let y = cell[0][1] * self[0] as f64 + cell[1][1] * self[1] as f64 + cell[2][1] * self[2] as f64;
        let z = cell[0][2] * self[0] as f64 + cell[1][2] * self[1] as f64 + cell[2][2] * self[2] as f64;
        Vector3D::new(x, y, z)
    }

    /// Get the components of this shift
    pub fn as_array(&self) -> [i32; 3] {
        self.0
    }
}

impl From<[i32; 3]> for CellShift {
    fn from(shift: [i32; 3]) -> CellShift {
        CellShift(shift)
    }
}

impl std::ops::Add<CellShift> for CellShift {
    type Output = CellShift;

    fn add(mut self, rhs: CellShift) -> Self::Output {
        self.0[0] += rhs[0];
        self.0[1] += rhs[1];
        self.0[2] += rhs[2];
        return self;
    }
}

impl std::ops::Sub<CellShift> for CellShift {
    type Output = CellShift;

    fn sub(mut self, rhs: CellShift) -> Self::Output {
        self.0[0] -= rhs[0];
        self.0[1] -= rhs[1];
        self.0[2] -= rhs[2];
        return self;
    }
}

impl std::ops::Neg for CellShift {
    type Output = CellShift;

    fn neg(self) -> Self::Output {
        CellShift([-self[0], -self[1], -self[2]])
    }
}

impl std::ops::Index<usize> for CellShift {
    type Output = i32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// A single neighbor of a central particle, as produced by
/// [`CutoffNeighborFinder::find`].
///
/// With periodic boundary conditions, the same particle can be a neighbor
/// multiple times, with a different `cell_shift` and `vector` each time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// index of the neighbor particle
    pub neighbor: usize,
    /// distance between the central particle and this image of the neighbor
    pub distance: f64,
    /// vector from the central particle to this image of the neighbor. This
    /// is `position[neighbor] - position[center] + cell_shift.cartesian(H)`
    /// where `H` is the cell matrix.
    pub vector: Vector3D,
    /// how many times each periodic boundary was crossed to go from the
    /// central particle to this image of the neighbor
    pub cell_shift: CellShift,
}

impl Neighbor {
    /// Get the squared distance between the central particle and this
    /// neighbor
    pub fn distance2(&self) -> f64 {
        self.vector.norm2()
    }
}

/// Pair of particles coming from a half neighbor list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// index of the first particle in the pair
    pub first: usize,
    /// index of the second particle in the pair
    pub second: usize,
    /// distance between the two particles
    pub distance: f64,
    /// vector from the first particle to the second particle, accounting for
    /// periodic boundary conditions. This is `position[second] -
    /// position[first] + H * cell_shift` where `H` is the cell matrix.
    pub vector: Vector3D,
    /// How many cell shifts where applied to the `second` particle to create
    /// this pair.
    pub cell_shift: CellShift,
}
