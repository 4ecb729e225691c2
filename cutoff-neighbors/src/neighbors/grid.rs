use log::{debug, info};
use ndarray::Array3;

use crate::{Error, Matrix3, Vector3D};
use crate::systems::SimulationCell;

use super::CellShift;

/// Largest number of cells a particle can be away from the central cell, and
/// largest number of bins searched around a particle. This leaves room to add
/// and subtract a few of these values without overflowing the `i32` inside
/// `CellShift`.
const MAX_SHIFT: i64 = i32::MAX as i64 / 4;

/// Largest number of bins in the cube around a particle that can be checked
/// when building the search stencil.
const MAX_STENCIL_BINS: f64 = 1e8;

/// Bins are enlarged by this fraction of their size when deciding which of
/// them can contain neighbors, to accommodate rounding errors when sorting
/// particles in bins.
const BIN_MARGIN: f64 = 1e-6;

/// Where a single particle lives inside the `BinGrid`
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinnedParticle {
    /// index of the bin containing the (wrapped) particle
    pub bin: [usize; 3],
    /// shift from the wrapped position inside the central cell to the actual
    /// particle position, along periodic directions only
    pub wrap: CellShift,
}

/// The bin grid sorts particles inside bins, such that neighbors of a given
/// particle can be found by looking only at a few bins around the particle.
///
/// Along periodic directions, bins cover the whole cell and particles are
/// wrapped inside the cell before being assigned to a bin. Along non-periodic
/// directions, bins cover the range spanned by the particles.
///
/// The number of bins to search in each direction depends on the cutoff and
/// the width of the bins.
#[derive(Debug, Clone)]
pub(crate) struct BinGrid {
    /// Cell used to go from cartesian to fractional coordinates. This is the
    /// simulation cell if any direction is periodic, and an identity cell
    /// otherwise.
    frame: SimulationCell,
    /// Fractional coordinate of the start of the first bin in each direction
    lower: [f64; 3],
    /// Size of the bins in fractional coordinates
    bin_size: [f64; 3],
    /// Cartesian vectors spanning a single bin
    bin_vectors: [Vector3D; 3],
    /// How many bins do we need to look at in each direction when searching
    /// neighbors to include all neighbors below the cutoff
    n_search: [i32; 3],
    /// the bins themselves, containing indexes of the particles
    bins: Array3<Vec<usize>>,
    /// bin and wrapping shift for each particle
    particles: Vec<BinnedParticle>,
}

/// Check that the cell and positions can be used to search for neighbors
fn check_input(cell: &SimulationCell, positions: &[Vector3D]) -> Result<(), Error> {
    if !cell.is_finite() {
        return Err(Error::Configuration(
            "the simulation cell matrix or origin contains non-finite values".into()
        ));
    }

    if cell.is_periodic() && cell.is_degenerate() {
        return Err(Error::Configuration(
            "the simulation cell is degenerate but has periodic boundary conditions".into()
        ));
    }

    for (index, position) in positions.iter().enumerate() {
        if !position.as_array().iter().all(|value| value.is_finite()) {
            return Err(Error::Configuration(format!(
                "position of particle {} is not finite: {:?}", index, position.as_array()
            )));
        }
    }

    return Ok(());
}

impl BinGrid {
    /// Create a new `BinGrid` for the given particles, sorting all of them in
    /// the corresponding bins.
    ///
    /// The grid will use at most `max_bins` bins in total, giving up some
    /// search efficiency when the cell is very large compared to the cutoff.
    ///
    /// This fails if the cell or positions contain non-finite values, if the
    /// cell is degenerate and periodic, or if a particle is so far away from
    /// the central cell that its periodic shift can not be represented.
    pub fn new(cell: &SimulationCell, positions: &[Vector3D], cutoff: f64, max_bins: usize) -> Result<BinGrid, Error> {
        debug_assert!(cutoff > 0.0 && max_bins > 0);
        check_input(cell, positions)?;

        let frame = if cell.is_periodic() {
            *cell
        } else {
            // fully non-periodic systems don't need the cell at all, and it
            // might even be degenerate
            SimulationCell::new(Matrix3::one()).with_pbc([false, false, false])
        };
        let pbc = frame.pbc();
        let distances_between_faces = frame.distances_between_faces();

        let fractional = positions.iter()
            .map(|&position| frame.fractional(position))
            .collect::<Vec<_>>();

        let mut lower = [0.0; 3];
        let mut extent = [1.0; 3];
        for axis in 0..3 {
            if pbc[axis] || fractional.is_empty() {
                continue;
            }

            let min = fractional.iter().map(|f| f[axis]).fold(f64::INFINITY, f64::min);
            let max = fractional.iter().map(|f| f[axis]).fold(f64::NEG_INFINITY, f64::max);
            lower[axis] = min;
            extent[axis] = max - min;
        }

        let mut n_bins = [1; 3];
        for axis in 0..3 {
            let width = extent[axis] * distances_between_faces[axis];
            let count = f64::floor(width / cutoff);
            if count >= max_bins as f64 {
                n_bins[axis] = max_bins;
            } else if count >= 1.0 {
                n_bins[axis] = count as usize;
            }
        }
        let n_bins = limit_bins_count(n_bins, max_bins);

        let matrix = frame.matrix();
        let mut bin_size = [1.0; 3];
        let mut bin_vectors = [Vector3D::zero(); 3];
        let mut n_search = [0; 3];
        for axis in 0..3 {
            if extent[axis] > 0.0 {
                bin_size[axis] = extent[axis] / n_bins[axis] as f64;
            }
            bin_vectors[axis] = Vector3D::from(matrix[axis]) * bin_size[axis];

            if !pbc[axis] && n_bins[axis] == 1 {
                // a single bin and no periodic images, nothing else to look at
                continue;
            }

            // one additional bin on each side accounts for particles sitting
            // exactly on bin boundaries
            let bin_width = bin_size[axis] * distances_between_faces[axis];
            let search = f64::floor(cutoff / bin_width) + 1.0;
            if pbc[axis] {
                if search > MAX_SHIFT as f64 {
                    return Err(Error::Configuration(format!(
                        "the cutoff ({}) is too large compared to the cell: searching \
                        neighbors would require {} bins along cell vector {}",
                        cutoff, search, axis
                    )));
                }
                n_search[axis] = search as i32;
            } else {
                n_search[axis] = f64::min(search, (n_bins[axis] - 1) as f64) as i32;
            }
        }

        let mut grid = BinGrid {
            frame: frame,
            lower: lower,
            bin_size: bin_size,
            bin_vectors: bin_vectors,
            n_search: n_search,
            bins: Array3::from_elem(n_bins, Vec::new()),
            particles: Vec::with_capacity(positions.len()),
        };

        for (index, &fractional) in fractional.iter().enumerate() {
            let particle = grid.locate_fractional(fractional).ok_or_else(|| Error::Configuration(format!(
                "particle {} is too far away from the periodic cell to represent its periodic shift",
                index
            )))?;

            grid.bins[particle.bin].push(index);
            grid.particles.push(particle);
        }

        debug!(
            "sorted {} particles in {}x{}x{} bins, searching {:?} bins around each one",
            positions.len(), n_bins[0], n_bins[1], n_bins[2], n_search
        );

        return Ok(grid);
    }

    /// Get the number of bins along each direction
    pub fn shape(&self) -> [usize; 3] {
        let shape = self.bins.shape();
        return [shape[0], shape[1], shape[2]];
    }

    /// Get the number of bins to search on each side of a given bin
    pub fn n_search(&self) -> [i32; 3] {
        self.n_search
    }

    /// Get periodic boundary conditions used for this grid
    pub fn pbc(&self) -> [bool; 3] {
        self.frame.pbc()
    }

    /// Get the width of the bins along each direction, *i.e.* the distance
    /// between opposite faces of a single bin
    pub fn bin_widths(&self) -> [f64; 3] {
        let distances = self.frame.distances_between_faces();
        return [
            self.bin_size[0] * distances[0],
            self.bin_size[1] * distances[1],
            self.bin_size[2] * distances[2],
        ];
    }

    /// Get the bin and wrapping shift of the particle at `index`
    pub fn particle(&self, index: usize) -> BinnedParticle {
        self.particles[index]
    }

    /// Get the particles inside the given bin
    pub fn bin(&self, bin: [usize; 3]) -> &[usize] {
        &self.bins[bin]
    }

    /// Find the bin containing an arbitrary `position`, and the shift from the
    /// wrapped position inside the central cell to this position. Positions
    /// outside of the grid along non-periodic directions are assigned to the
    /// closest bin.
    pub fn locate(&self, position: Vector3D) -> Result<BinnedParticle, Error> {
        if !position.as_array().iter().all(|value| value.is_finite()) {
            return Err(Error::Configuration(format!(
                "position is not finite: {:?}", position.as_array()
            )));
        }
        return self.locate_fractional(self.frame.fractional(position)).ok_or_else(|| Error::Configuration(format!(
            "position {:?} is too far away from the periodic cell to represent its periodic shift",
            position.as_array()
        )));
    }

    /// Find the bin and wrapping shift for the given fractional coordinates,
    /// returning `None` if the shift does not fit in a `CellShift`
    fn locate_fractional(&self, fractional: Vector3D) -> Option<BinnedParticle> {
        let shape = self.shape();
        let pbc = self.pbc();

        let mut bin = [0; 3];
        let mut wrap = [0; 3];
        for axis in 0..3 {
            let scaled = f64::floor((fractional[axis] - self.lower[axis]) / self.bin_size[axis]);
            // saturating conversion, anything too large is caught below
            let scaled = if scaled.is_nan() { 0 } else { scaled as i64 };
            if pbc[axis] {
                let (quotient, remainder) = divmod(scaled, shape[axis]);
                if quotient.abs() > MAX_SHIFT {
                    return None;
                }
                wrap[axis] = quotient as i32;
                bin[axis] = remainder;
            } else {
                // particles at the upper boundary of the range go in the
                // last bin
                bin[axis] = i64::clamp(scaled, 0, shape[axis] as i64 - 1) as usize;
            }
        }

        return Some(BinnedParticle {
            bin: bin,
            wrap: CellShift::new(wrap),
        });
    }

    /// Find the bin located at `offset` from `center`, and the shift
    /// corresponding to crossing the periodic boundaries to reach it. This
    /// returns `None` if the bin is outside of the grid along a non-periodic
    /// direction.
    pub fn neighbor_bin(&self, center: [usize; 3], offset: [i32; 3]) -> Option<([usize; 3], CellShift)> {
        let shape = self.shape();
        let pbc = self.pbc();

        let mut bin = [0; 3];
        let mut shift = [0; 3];
        for axis in 0..3 {
            let index = center[axis] as i64 + offset[axis] as i64;
            if pbc[axis] {
                let (quotient, remainder) = divmod(index, shape[axis]);
                shift[axis] = quotient as i32;
                bin[axis] = remainder;
            } else if index < 0 || index >= shape[axis] as i64 {
                return None;
            } else {
                bin[axis] = index as usize;
            }
        }

        return Some((bin, CellShift::new(shift)));
    }

    /// Get the shortest distance between any two points located in two bins
    /// separated by `offset`.
    pub fn shortest_distance(&self, offset: [i32; 3]) -> f64 {
        if offset.iter().all(|o| o.abs() <= 1) {
            // the bins touch
            return 0.0;
        }

        // all the vectors going from one bin to the other form a
        // parallelepiped, spanning two bins in each direction
        let mut corner = Vector3D::zero();
        let mut edges = [Vector3D::zero(); 3];
        for axis in 0..3 {
            corner += self.bin_vectors[axis] * (offset[axis] as f64 - 1.0 - BIN_MARGIN);
            edges[axis] = self.bin_vectors[axis] * (2.0 + 2.0 * BIN_MARGIN);
        }

        return distance_to_parallelepiped(corner, edges);
    }

    /// Get the offsets of all bins that can contain neighbors within `cutoff`
    /// of a particle, searching up to `n_search` bins in each direction.
    pub fn stencil(&self, cutoff: f64) -> Result<Vec<[i32; 3]>, Error> {
        let [nx, ny, nz] = self.n_search;
        let count = self.n_search.iter().map(|&n| 2.0 * n as f64 + 1.0).product::<f64>();
        if count > MAX_STENCIL_BINS {
            return Err(Error::Configuration(format!(
                "the cutoff ({}) is too large compared to the cell: searching neighbors \
                would require looking at {} bins around each particle",
                cutoff, count
            )));
        }

        let mut stencil = Vec::new();
        for ox in -nx..=nx {
            for oy in -ny..=ny {
                for oz in -nz..=nz {
                    let offset = [ox, oy, oz];
                    if self.shortest_distance(offset) <= cutoff {
                        stencil.push(offset);
                    }
                }
            }
        }

        debug!("searching {} bins out of {} around each particle", stencil.len(), count);

        return Ok(stencil);
    }
}

/// Get the shortest distance between the origin and the parallelepiped
/// `corner + a * edges[0] + b * edges[1] + c * edges[2]` with `a, b, c` in
/// `[0, 1]`. The origin must be outside of the parallelepiped.
///
/// The closest point is either a vertex, or the orthogonal projection of the
/// origin on an edge or a face, so we check all of them.
fn distance_to_parallelepiped(corner: Vector3D, edges: [Vector3D; 3]) -> f64 {
    let mut distance2 = f64::INFINITY;
    // each direction is either fixed at the start (0) or the end (1) of the
    // edge, or free (2)
    for state in 0..27 {
        let states = [state % 3, (state / 3) % 3, state / 9];

        let mut point = corner;
        let mut free = Vec::with_capacity(2);
        for axis in 0..3 {
            match states[axis] {
                0 => {},
                1 => point += edges[axis],
                _ => free.push(edges[axis]),
            }
        }

        match free.len() {
            0 => {},
            1 => {
                let edge = free[0];
                let t = -(point * edge) / edge.norm2();
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                point += edge * t;
            }
            2 => {
                let (u, v) = (free[0], free[1]);
                let (uu, uv, vv) = (u * u, u * v, v * v);
                let (pu, pv) = (point * u, point * v);

                let determinant = uu * vv - uv * uv;
                if determinant <= 0.0 {
                    continue;
                }

                let s = (uv * pv - vv * pu) / determinant;
                let t = (uv * pu - uu * pv) / determinant;
                if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&t) {
                    continue;
                }
                point += u * s + v * t;
            }
            // the origin is outside, the closest point is on the surface
            _ => continue,
        }

        distance2 = f64::min(distance2, point.norm2());
    }

    return f64::sqrt(distance2);
}

/// Reduce the number of bins in each direction until the total is below
/// `max_bins`, keeping roughly the same ratio between directions.
fn limit_bins_count(mut n_bins: [usize; 3], max_bins: usize) -> [usize; 3] {
    let initial = n_bins;
    loop {
        let total = n_bins.iter().map(|&n| n as f64).product::<f64>();
        if total <= max_bins as f64 {
            break;
        }

        let splitted = n_bins.iter().filter(|&&n| n > 1).count();
        let factor = f64::powf(max_bins as f64 / total, 1.0 / splitted as f64);
        for n in &mut n_bins {
            if *n > 1 {
                *n = usize::max(f64::floor(*n as f64 * factor) as usize, 1);
            }
        }
    }

    if n_bins != initial {
        info!(
            "too many bins for the neighbor search ({}x{}x{}), using {}x{}x{} instead",
            initial[0], initial[1], initial[2], n_bins[0], n_bins[1], n_bins[2]
        );
    }

    return n_bins;
}

/// Function to compute both quotient and remainder of the division of a by b.
/// This function follows Python convention, making sure the remainder have the
/// same sign as `b`.
fn divmod(a: i64, b: usize) -> (i64, usize) {
    debug_assert!(b > 0 && b < (i32::MAX as usize));
    let b = b as i64;
    return (a.div_euclid(b), a.rem_euclid(b) as usize);
}
