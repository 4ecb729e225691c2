use log::warn;
use rayon::prelude::*;

use crate::Error;

use super::{CellShift, CutoffNeighborFinder, Neighbor, NeighborQuery, Pair};

/// Pairs closer than this distance are most likely overlapping particles
const CLOSE_PAIR_DISTANCE: f64 = 1e-3;

/// Pre-computed neighbor lists for all particles known to a
/// [`CutoffNeighborFinder`].
///
/// This contains both a "full" neighbor list, where each pair of neighbors
/// appears twice (once from each particle); and a "half" neighbor list, where
/// each pair appears only once.
#[derive(Clone, Debug)]
pub struct NeighborList {
    /// the cutoff used to create this neighbor list
    cutoff: f64,
    /// all pairs in the system
    pairs: Vec<Pair>,
    /// all pairs associated with a given particle
    pairs_by_particle: Vec<Vec<Pair>>,
    /// all neighbors of a given particle
    neighbors: Vec<Vec<Neighbor>>,
}

impl NeighborList {
    /// Run the neighbor search for all particles in the `finder`, in parallel.
    #[time_graph::instrument(name = "NeighborList::new")]
    pub fn new(finder: &CutoffNeighborFinder) -> NeighborList {
        let neighbors = (0..finder.len()).into_par_iter()
            .map(|center| {
                let mut neighbors = NeighborQuery::new(finder, center).collect::<Vec<_>>();
                neighbors.sort_unstable_by_key(|neighbor| (neighbor.neighbor, neighbor.cell_shift));
                neighbors
            })
            .collect::<Vec<_>>();

        let mut pairs = Vec::new();
        let mut pairs_by_particle = vec![Vec::new(); finder.len()];
        for (first, neighbors) in neighbors.iter().enumerate() {
            for neighbor in neighbors {
                if !in_half_list(first, neighbor) {
                    continue;
                }

                if neighbor.distance < CLOSE_PAIR_DISTANCE {
                    warn!(
                        "particles {} and {} are very close to one another ({} distance units)",
                        first, neighbor.neighbor, neighbor.distance
                    );
                }

                let pair = Pair {
                    first: first,
                    second: neighbor.neighbor,
                    distance: neighbor.distance,
                    vector: neighbor.vector,
                    cell_shift: neighbor.cell_shift,
                };

                pairs.push(pair);
                pairs_by_particle[pair.first].push(pair);
                if pair.first != pair.second {
                    pairs_by_particle[pair.second].push(pair);
                }
            }
        }

        // the pairs are already sorted by first and second particle, since
        // the neighbors are sorted by index
        debug_assert!(pairs.windows(2).all(|w| (w[0].first, w[0].second) <= (w[1].first, w[1].second)));
        for pairs in &mut pairs_by_particle {
            pairs.sort_by_key(|pair| (pair.first, pair.second));
        }

        return NeighborList {
            cutoff: finder.cutoff(),
            pairs: pairs,
            pairs_by_particle: pairs_by_particle,
            neighbors: neighbors,
        };
    }

    /// Get the cutoff used to create this neighbor list
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Get the number of particles in this neighbor list
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Check whether this neighbor list contains no particles
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Get the half neighbor list. Each pair appears only once, with
    /// `first <= second`, sorted by `(first, second)`.
    ///
    /// If two particles are neighbors of one another more than once (this can
    /// happen when the cutoff is larger than half the cell), all pairs at
    /// different distances/directions are still included.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Get all pairs in the half neighbor list containing the particle at
    /// `index`, either as the first or second particle of the pair.
    pub fn pairs_containing(&self, index: usize) -> Result<&[Pair], Error> {
        self.check_index(index)?;
        return Ok(&self.pairs_by_particle[index]);
    }

    /// Get the full list of neighbors of the particle at `index`, sorted by
    /// neighbor index and then cell shift.
    pub fn neighbors(&self, index: usize) -> Result<&[Neighbor], Error> {
        self.check_index(index)?;
        return Ok(&self.neighbors[index]);
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
}

/// Should the pair between `first` and this `neighbor` be part of the half
/// neighbor list?
fn in_half_list(first: usize, neighbor: &Neighbor) -> bool {
    if first != neighbor.neighbor {
        return first < neighbor.neighbor;
    }

    // A particle sees its own periodic images with both `shift` and
    // `-shift`, and we only want to keep one of these. We keep the shifts
    // where the last non-zero component is positive, indicated with `O`
    // below when looking at the shift[1]/shift[2] plane.
    //
    //  O O O │ O O O
    //  O O O │ O O O
    //  O O O │ O O O
    // ─X─X─X─┼─O─O─O─
    //  X X X │ X X X
    //  X X X │ X X X
    //  X X X │ X X X
    return is_positive(neighbor.cell_shift);
}

fn is_positive(shift: CellShift) -> bool {
    for axis in (0..3).rev() {
        if shift[axis] != 0 {
            return shift[axis] > 0;
        }
    }
    return false;
}
