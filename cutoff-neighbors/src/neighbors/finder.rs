use log::{debug, info};

use crate::{Error, Vector3D};
use crate::systems::{SimulationCell, System};

use super::{CellShift, FinderParameters, Neighbor};
use super::grid::BinGrid;

/// A neighbor finder for a fixed set of particles, looking for all periodic
/// images of other particles within a spherical cutoff.
///
/// The finder takes a snapshot of the positions and cell when it is built, and
/// sorts all particles in bins. It can then be queried any number of times for
/// the neighbors of a given particle with [`CutoffNeighborFinder::find`].
/// Moving particles in the caller storage after construction does not affect
/// the finder.
///
/// Queries only read the finder, so it can be shared between threads, with
/// each thread querying different particles.
///
/// ```
/// # use cutoff_neighbors::{Vector3D, systems::SimulationCell};
/// # use cutoff_neighbors::neighbors::CutoffNeighborFinder;
/// let positions = [Vector3D::new(0.0, 0.0, 0.0), Vector3D::new(1.0, 0.0, 0.0)];
/// let finder = CutoffNeighborFinder::new(1.5, &positions, SimulationCell::infinite()).unwrap();
///
/// let neighbors = finder.find(0).unwrap().collect::<Vec<_>>();
/// assert_eq!(neighbors.len(), 1);
/// assert_eq!(neighbors[0].neighbor, 1);
/// assert_eq!(neighbors[0].distance, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct CutoffNeighborFinder {
    parameters: FinderParameters,
    cell: SimulationCell,
    positions: Vec<Vector3D>,
    grid: BinGrid,
    /// offsets of the bins to search around each particle
    stencil: Vec<[i32; 3]>,
}

impl CutoffNeighborFinder {
    /// Create a new neighbor finder for particles at the given `positions`,
    /// with the given simulation `cell` and `cutoff`, using default values
    /// for all other parameters.
    pub fn new(cutoff: f64, positions: &[Vector3D], cell: SimulationCell) -> Result<CutoffNeighborFinder, Error> {
        CutoffNeighborFinder::with_parameters(&FinderParameters::new(cutoff), positions, cell)
    }

    /// Create a new neighbor finder for particles at the given `positions`,
    /// with the given simulation `cell` and `parameters`.
    ///
    /// This fails if the parameters are invalid, if any position or the cell
    /// contains non-finite values, if the cell is degenerate while being
    /// periodic along at least one direction, or if the periodic shifts needed
    /// to reach some particles or to cover the cutoff do not fit in a
    /// [`CellShift`].
    #[time_graph::instrument(name = "CutoffNeighborFinder::new")]
    pub fn with_parameters(
        parameters: &FinderParameters,
        positions: &[Vector3D],
        cell: SimulationCell,
    ) -> Result<CutoffNeighborFinder, Error> {
        parameters.validate()?;

        let grid = BinGrid::new(&cell, positions, parameters.cutoff, parameters.max_bins)?;
        let stencil = grid.stencil(parameters.cutoff)?;

        let finder = CutoffNeighborFinder {
            parameters: *parameters,
            cell: cell,
            positions: positions.to_vec(),
            grid: grid,
            stencil: stencil,
        };

        let images = finder.periodic_images();
        if images.iter().any(|&n| n > 1) {
            info!(
                "the cutoff ({}) is larger than the cell, looking through {:?} periodic images",
                finder.cutoff(), images
            );
        }

        return Ok(finder);
    }

    /// Create a new neighbor finder using the particles and cell from the
    /// given `system`.
    pub fn from_system(parameters: &FinderParameters, system: &dyn System) -> Result<CutoffNeighborFinder, Error> {
        let cell = system.cell()?;
        let positions = system.positions()?;
        let size = system.size()?;
        if positions.len() != size {
            return Err(Error::System(format!(
                "the system contains {} particles but gave {} positions", size, positions.len()
            )));
        }

        debug!("building neighbor finder for a system with {} particles", size);
        return CutoffNeighborFinder::with_parameters(parameters, positions, cell);
    }

    /// Get the cutoff used by this finder
    pub fn cutoff(&self) -> f64 {
        self.parameters.cutoff
    }

    /// Get the squared cutoff used by this finder
    pub fn cutoff_squared(&self) -> f64 {
        self.parameters.cutoff * self.parameters.cutoff
    }

    /// Get the parameters used to create this finder
    pub fn parameters(&self) -> &FinderParameters {
        &self.parameters
    }

    /// Get the number of particles in this finder
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check whether this finder contains no particles
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get the simulation cell used by this finder
    pub fn cell(&self) -> &SimulationCell {
        &self.cell
    }

    /// Get the positions of all particles, as given when creating this finder
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get the number of bins used to sort particles along each direction
    pub fn bins_count(&self) -> [usize; 3] {
        self.grid.shape()
    }

    /// Get the number of bins searched on each side of the bin containing a
    /// given particle, along each direction
    pub fn search_extent(&self) -> [usize; 3] {
        let n_search = self.grid.n_search();
        return [n_search[0] as usize, n_search[1] as usize, n_search[2] as usize];
    }

    /// Get the number of bins actually visited around each particle, out of
    /// the `(2 * search_extent + 1)` bins along each direction
    pub fn searched_bins(&self) -> usize {
        self.stencil.len()
    }

    /// Get the number of periodic images of the cell covered by the search on
    /// each side of the central cell, along each direction. This is zero
    /// along non-periodic directions.
    pub fn periodic_images(&self) -> [usize; 3] {
        let pbc = self.grid.pbc();
        let shape = self.grid.shape();
        let extent = self.search_extent();

        let mut images = [0; 3];
        for axis in 0..3 {
            if pbc[axis] {
                images[axis] = (extent[axis] + shape[axis] - 1) / shape[axis];
            }
        }
        return images;
    }

    fn check_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index: index,
                count: self.len(),
            });
        }
        return Ok(());
    }

    /// Find all neighbors of the particle at `index`, i.e. all periodic images
    /// of all particles at a distance smaller than or equal to the cutoff.
    ///
    /// The particle itself is never its own neighbor, but its periodic images
    /// can be if the cutoff is larger than the cell. The neighbors are
    /// produced lazily, in no particular order.
    pub fn find(&self, index: usize) -> Result<NeighborQuery<'_>, Error> {
        self.check_index(index)?;
        return Ok(NeighborQuery::new(self, index));
    }

    /// Check if the particle `j` (or any of its periodic images) is a
    /// neighbor of the particle `i`.
    pub fn are_neighbors(&self, i: usize, j: usize) -> Result<bool, Error> {
        self.check_index(j)?;
        return Ok(self.find(i)?.any(|neighbor| neighbor.neighbor == j));
    }

    /// Count the neighbors of the particle at `index`, including all periodic
    /// images separately.
    pub fn neighbors_count(&self, index: usize) -> Result<usize, Error> {
        return Ok(self.find(index)?.count());
    }
}

/// Iterator over the neighbors of a single particle, created by
/// [`CutoffNeighborFinder::find`].
#[derive(Debug, Clone)]
pub struct NeighborQuery<'a> {
    finder: &'a CutoffNeighborFinder,
    center: usize,
    center_bin: [usize; 3],
    center_wrap: CellShift,
    /// offsets of the bins remaining to visit
    offsets: std::slice::Iter<'a, [i32; 3]>,
    /// particles to look at in the current bin
    candidates: std::slice::Iter<'a, usize>,
    /// shift to apply to all particles in the current bin, before removing
    /// their own wrapping shift
    bin_shift: CellShift,
}

impl<'a> NeighborQuery<'a> {
    /// Start a new query, `center` must be a valid particle index
    pub(super) fn new(finder: &'a CutoffNeighborFinder, center: usize) -> NeighborQuery<'a> {
        let particle = finder.grid.particle(center);

        NeighborQuery {
            finder: finder,
            center: center,
            center_bin: particle.bin,
            center_wrap: particle.wrap,
            offsets: finder.stencil.iter(),
            candidates: Default::default(),
            bin_shift: CellShift::default(),
        }
    }

    /// Get the index of the particle for which we are searching neighbors
    pub fn center(&self) -> usize {
        self.center
    }

    /// Move to the next bin in the search region, returning `false` if all
    /// bins have already been visited.
    fn advance_bin(&mut self) -> bool {
        for &offset in &mut self.offsets {
            if let Some((bin, shift)) = self.finder.grid.neighbor_bin(self.center_bin, offset) {
                let candidates = self.finder.grid.bin(bin);
                if candidates.is_empty() {
                    continue;
                }

                self.candidates = candidates.iter();
                self.bin_shift = shift + self.center_wrap;
                return true;
            }
        }

        return false;
    }
}

impl<'a> Iterator for NeighborQuery<'a> {
    type Item = Neighbor;

    fn next(&mut self) -> Option<Neighbor> {
        let cutoff2 = self.finder.cutoff_squared();
        let cell = &self.finder.cell;
        let positions = &self.finder.positions;

        loop {
            for &other in &mut self.candidates {
                let shift = self.bin_shift - self.finder.grid.particle(other).wrap;
                if other == self.center && shift.is_zero() {
                    continue;
                }

                let vector = positions[other] - positions[self.center] + cell.shift_vector(shift);
                let distance2 = vector.norm2();
                if distance2 <= cutoff2 {
                    return Some(Neighbor {
                        neighbor: other,
                        distance: distance2.sqrt(),
                        vector: vector,
                        cell_shift: shift,
                    });
                }
            }

            if !self.advance_bin() {
                return None;
            }
        }
    }
}

impl<'a> std::iter::FusedIterator for NeighborQuery<'a> {}
