use crate::Error;

use super::{SimulationCell, System, Vector3D};

/// A simple implementation of `System` to use when no other is available
#[derive(Clone, Debug)]
pub struct SimpleSystem {
    cell: SimulationCell,
    positions: Vec<Vector3D>,
}

impl SimpleSystem {
    /// Create a new empty system with the given simulation cell
    pub fn new(cell: SimulationCell) -> SimpleSystem {
        SimpleSystem {
            cell: cell,
            positions: Vec::new(),
        }
    }

    /// Add a particle at the given position to this system
    pub fn add_particle(&mut self, position: Vector3D) {
        self.positions.push(position);
    }

    /// Get mutable access to the positions of the particles in this system
    pub fn positions_mut(&mut self) -> &mut [Vector3D] {
        &mut self.positions
    }

    /// Replace the simulation cell of this system
    pub fn set_cell(&mut self, cell: SimulationCell) {
        self.cell = cell;
    }
}

impl System for SimpleSystem {
    fn size(&self) -> Result<usize, Error> {
        Ok(self.positions.len())
    }

    fn positions(&self) -> Result<&[Vector3D], Error> {
        Ok(&self.positions)
    }

    fn cell(&self) -> Result<SimulationCell, Error> {
        Ok(self.cell)
    }
}

impl std::convert::TryFrom<&dyn System> for SimpleSystem {
    type Error = Error;

    fn try_from(system: &dyn System) -> Result<SimpleSystem, Error> {
        let mut new = SimpleSystem::new(system.cell()?);
        for &position in system.positions()? {
            new.add_particle(position);
        }
        return Ok(new);
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;

    #[test]
    fn add_particles() {
        let mut system = SimpleSystem::new(SimulationCell::cubic(10.0));
        system.add_particle(Vector3D::new(2.0, 3.0, 4.0));
        system.add_particle(Vector3D::new(1.0, 3.0, 4.0));
        system.add_particle(Vector3D::new(5.0, 3.0, 4.0));

        assert_eq!(system.size().unwrap(), 3);
        assert_eq!(system.positions().unwrap(), &[
            Vector3D::new(2.0, 3.0, 4.0),
            Vector3D::new(1.0, 3.0, 4.0),
            Vector3D::new(5.0, 3.0, 4.0),
        ]);
        assert_eq!(system.cell().unwrap(), SimulationCell::cubic(10.0));
    }

    #[test]
    fn modify() {
        let mut system = SimpleSystem::new(SimulationCell::cubic(10.0));
        system.add_particle(Vector3D::new(2.0, 3.0, 4.0));

        system.positions_mut()[0] = Vector3D::new(-1.0, 0.0, 0.0);
        assert_eq!(system.positions().unwrap()[0], Vector3D::new(-1.0, 0.0, 0.0));

        system.set_cell(SimulationCell::infinite());
        assert!(system.cell().unwrap().is_infinite());
    }

    #[test]
    fn convert() {
        let mut system = SimpleSystem::new(SimulationCell::cubic(5.0).with_pbc([true, true, false]));
        system.add_particle(Vector3D::new(2.0, 3.0, 4.0));
        system.add_particle(Vector3D::new(1.0, 3.0, 4.0));

        let copy = SimpleSystem::try_from(&system as &dyn System).unwrap();
        assert_eq!(copy.positions().unwrap(), system.positions().unwrap());
        assert_eq!(copy.cell().unwrap().pbc(), [true, true, false]);
    }
}
