use log::debug;

use crate::{Error, Vector3D};
use crate::systems::{SimulationCell, System};

use super::{CellShift, Neighbor};
use super::grid::{BinGrid, BinnedParticle};
use super::parameters::DEFAULT_MAX_BINS;

/// A neighbor finder looking for a fixed number of nearest neighbors of a
/// particle (or of any point in space), taking periodic images into account.
///
/// This is the counterpart of [`CutoffNeighborFinder`] when the number of
/// neighbors matters more than their distance. Results are sorted by
/// increasing distance, ties being broken by neighbor index and cell shift.
///
/// ```
/// # use cutoff_neighbors::{Vector3D, SimulationCell};
/// # use cutoff_neighbors::neighbors::NearestNeighborFinder;
/// let positions = [Vector3D::new(0.0, 0.0, 0.0)];
/// let finder = NearestNeighborFinder::new(6, &positions, SimulationCell::cubic(2.0)).unwrap();
///
/// // the 6 closest images of the particle itself
/// let neighbors = finder.find(0).unwrap();
/// assert_eq!(neighbors.len(), 6);
/// assert!(neighbors.iter().all(|n| n.neighbor == 0 && n.distance == 2.0));
/// ```
///
/// [`CutoffNeighborFinder`]: super::CutoffNeighborFinder
#[derive(Debug, Clone)]
pub struct NearestNeighborFinder {
    count: usize,
    cell: SimulationCell,
    positions: Vec<Vector3D>,
    grid: BinGrid,
}

impl NearestNeighborFinder {
    /// Create a new finder looking for the `count` nearest neighbors of the
    /// particles at the given `positions`, inside the given simulation `cell`.
    ///
    /// This fails under the same conditions as
    /// [`CutoffNeighborFinder::new`](super::CutoffNeighborFinder::new), or if
    /// `count` is zero.
    #[time_graph::instrument(name = "NearestNeighborFinder::new")]
    pub fn new(count: usize, positions: &[Vector3D], cell: SimulationCell) -> Result<NearestNeighborFinder, Error> {
        if count == 0 {
            return Err(Error::Configuration(
                "the number of nearest neighbors must be at least 1".into()
            ));
        }

        let length = typical_length(count, positions, &cell);
        debug!("sorting particles in bins of size {} to find {} nearest neighbors", length, count);
        let grid = BinGrid::new(&cell, positions, length, DEFAULT_MAX_BINS)?;

        return Ok(NearestNeighborFinder {
            count: count,
            cell: cell,
            positions: positions.to_vec(),
            grid: grid,
        });
    }

    /// Create a new finder for the `count` nearest neighbors, using the
    /// particles and cell from the given `system`.
    pub fn from_system(count: usize, system: &dyn System) -> Result<NearestNeighborFinder, Error> {
        let cell = system.cell()?;
        let positions = system.positions()?;
        let size = system.size()?;
        if positions.len() != size {
            return Err(Error::System(format!(
                "the system contains {} particles but gave {} positions", size, positions.len()
            )));
        }

        debug!("building nearest neighbor finder for a system with {} particles", size);
        return NearestNeighborFinder::new(count, positions, cell);
    }

    /// Get the number of neighbors this finder is looking for
    pub fn count(&self) -> usize {
        self.count
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

    /// Find the `count` nearest neighbors of the particle at `index`, sorted
    /// by increasing distance.
    ///
    /// The particle itself is excluded, but its periodic images are not.
    /// Fewer neighbors are returned only if the system is not periodic and
    /// contains less than `count + 1` particles.
    pub fn find(&self, index: usize) -> Result<Vec<Neighbor>, Error> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index: index,
                count: self.len(),
            });
        }

        let center = self.grid.particle(index);
        return Ok(self.search(self.positions[index], center, Some(index)));
    }

    /// Find the `count` particles (or periodic images of particles) nearest to
    /// the given `point`, sorted by increasing distance. The `vector` of each
    /// neighbor goes from `point` to the neighbor.
    pub fn find_around(&self, point: Vector3D) -> Result<Vec<Neighbor>, Error> {
        let center = self.grid.locate(point)?;
        return Ok(self.search(point, center, None));
    }

    /// Search neighbors of `point`, visiting bins in shells of increasing size
    /// around the bin containing it until no unvisited bin can contain a
    /// closer neighbor.
    fn search(&self, point: Vector3D, center: BinnedParticle, exclude: Option<usize>) -> Vec<Neighbor> {
        let mut neighbors = Vec::new();
        if self.positions.is_empty() {
            return neighbors;
        }

        let shape = self.grid.shape();
        let pbc = self.grid.pbc();
        let widths = self.grid.bin_widths();

        // how many bins can we go below and above the central one
        let mut reach = [(i64::MAX, i64::MAX); 3];
        for axis in 0..3 {
            if !pbc[axis] {
                let bin = center.bin[axis] as i64;
                reach[axis] = (bin, shape[axis] as i64 - 1 - bin);
            }
        }

        let mut shell = 0_i64;
        loop {
            let ranges = [
                (-i64::min(shell, reach[0].0), i64::min(shell, reach[0].1)),
                (-i64::min(shell, reach[1].0), i64::min(shell, reach[1].1)),
                (-i64::min(shell, reach[2].0), i64::min(shell, reach[2].1)),
            ];

            for ox in ranges[0].0..=ranges[0].1 {
                for oy in ranges[1].0..=ranges[1].1 {
                    if ox.abs() == shell || oy.abs() == shell {
                        for oz in ranges[2].0..=ranges[2].1 {
                            self.visit([ox, oy, oz], point, center, exclude, &mut neighbors);
                        }
                    } else {
                        for oz in [-shell, shell] {
                            if ranges[2].0 <= oz && oz <= ranges[2].1 {
                                self.visit([ox, oy, oz], point, center, exclude, &mut neighbors);
                            }
                        }
                    }
                }
            }

            neighbors.sort_unstable_by(|a, b| {
                a.distance.total_cmp(&b.distance)
                    .then(a.neighbor.cmp(&b.neighbor))
                    .then(a.cell_shift.cmp(&b.cell_shift))
            });
            neighbors.truncate(self.count);

            // particles in bins outside of this shell are separated from the
            // center by at least `shell` bins along one direction. We keep one
            // bin of margin for rounding errors.
            let bound = (0..3)
                .filter(|&axis| reach[axis].0 > shell || reach[axis].1 > shell)
                .map(|axis| widths[axis] * (shell - 1).max(0) as f64)
                .fold(None, |bound: Option<f64>, width| Some(bound.map_or(width, |b| f64::min(b, width))));

            match bound {
                // all the bins have been visited
                None => break,
                Some(bound) => {
                    if neighbors.len() == self.count && neighbors[self.count - 1].distance < bound {
                        break;
                    }
                }
            }

            shell += 1;
        }

        return neighbors;
    }

    /// Add all particles in the bin at `offset` from the center to the
    /// candidate neighbors
    fn visit(
        &self,
        offset: [i64; 3],
        point: Vector3D,
        center: BinnedParticle,
        exclude: Option<usize>,
        neighbors: &mut Vec<Neighbor>,
    ) {
        let offset = [offset[0] as i32, offset[1] as i32, offset[2] as i32];
        let (bin, shift) = match self.grid.neighbor_bin(center.bin, offset) {
            Some(found) => found,
            None => return,
        };

        let bin_shift = shift + center.wrap;
        for &other in self.grid.bin(bin) {
            let cell_shift: CellShift = bin_shift - self.grid.particle(other).wrap;
            if exclude == Some(other) && cell_shift.is_zero() {
                continue;
            }

            let vector = self.positions[other] - point + self.cell.shift_vector(cell_shift);
            neighbors.push(Neighbor {
                neighbor: other,
                distance: vector.norm(),
                vector: vector,
                cell_shift: cell_shift,
            });
        }
    }
}

/// Get a bin size such that each bin contains around `count` particles
fn typical_length(count: usize, positions: &[Vector3D], cell: &SimulationCell) -> f64 {
    let volume = if cell.is_periodic() {
        cell.volume()
    } else {
        let mut volume = 1.0;
        for axis in 0..3 {
            let min = positions.iter().map(|p| p[axis]).fold(f64::INFINITY, f64::min);
            let max = positions.iter().map(|p| p[axis]).fold(f64::NEG_INFINITY, f64::max);
            volume *= max - min;
        }
        volume
    };

    let length = f64::cbrt(volume * count as f64 / usize::max(positions.len(), 1) as f64);
    if length.is_finite() && length > 0.0 {
        return length;
    } else {
        return 1.0;
    }
}
