use crate::{Error, Vector3D};

mod cell;
pub use self::cell::{SimulationCell, CellShape};

mod simple_system;
pub use self::simple_system::SimpleSystem;

#[cfg(test)]
pub(crate) mod test_utils;

/// A `System` provides the particle data (positions and simulation cell)
/// used to build neighbor finders.
///
/// This is the interface through which a host application exposes its own
/// particle storage: particles are identified by their index in
/// `0..self.size()`, and this index is the one used in neighbor queries.
pub trait System: Send + Sync {
    /// Get the simulation cell for this system
    fn cell(&self) -> Result<SimulationCell, Error>;

    /// Get the number of particles in this system
    fn size(&self) -> Result<usize, Error>;

    /// Get the positions for all particles in this system. The returned value
    /// must be a slice of length `self.size()` containing the Cartesian
    /// coordinates of all particles in the system. Positions do not need to be
    /// wrapped inside the cell.
    fn positions(&self) -> Result<&[Vector3D], Error>;
}
