use crate::{Vector3D, Matrix3};
use super::{SimulationCell, SimpleSystem};

pub fn test_system(name: &str) -> SimpleSystem {
    match name {
        "methane" => get_methane(),
        "water" => get_water(),
        "corners" => get_corners(),
        "NaCl" => get_nacl(),
        "CsCl" => get_cscl(),
        "ZnSO4" => get_znso4(),
        _ => panic!("unknown test system {}", name)
    }
}

/// Methane molecule, without periodic boundary conditions
fn get_methane() -> SimpleSystem {
    let mut system = SimpleSystem::new(SimulationCell::infinite());
    system.add_particle(Vector3D::new(5.0000, 5.0000, 5.0000));
    system.add_particle(Vector3D::new(5.5288, 5.1610, 5.9359));
    system.add_particle(Vector3D::new(5.2051, 5.8240, 4.3214));
    system.add_particle(Vector3D::new(5.3345, 4.0686, 4.5504));
    system.add_particle(Vector3D::new(3.9315, 4.9463, 5.1921));
    return system;
}

/// Water molecule in a large periodic box, crossing the box boundaries
fn get_water() -> SimpleSystem {
    let mut system = SimpleSystem::new(SimulationCell::cubic(10.0));
    system.add_particle(Vector3D::new(0.0, 0.0, 0.0));
    system.add_particle(Vector3D::new(0.0, 0.75545, -0.58895));
    system.add_particle(Vector3D::new(0.0, -0.75545, -0.58895));
    return system;
}

/// Particles at the eight corners of a periodic cube of side 10
fn get_corners() -> SimpleSystem {
    let mut system = SimpleSystem::new(SimulationCell::cubic(10.0));
    for &x in &[0.0, 10.0] {
        for &y in &[0.0, 10.0] {
            for &z in &[0.0, 10.0] {
                system.add_particle(Vector3D::new(x, y, z));
            }
        }
    }
    return system;
}

/// NaCl structure
/// Using a primitive cell, the distance between the
/// closest Na-Cl pair is exactly 1. The cubic cell
/// in these units would have a length of 2.
fn get_nacl() -> SimpleSystem {
    let cell = Matrix3::new([[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
    let mut system = SimpleSystem::new(SimulationCell::new(cell));
    system.add_particle(Vector3D::new(0.0, 0.0, 0.0));
    system.add_particle(Vector3D::new(1.0, 0.0, 0.0));
    return system;
}

/// CsCl structure
/// This structure is simple since the primitive cell
/// is just the usual cubic cell with side length set to one.
fn get_cscl() -> SimpleSystem {
    let mut system = SimpleSystem::new(SimulationCell::cubic(1.0));
    system.add_particle(Vector3D::new(0.0, 0.0, 0.0));
    system.add_particle(Vector3D::new(0.5, 0.5, 0.5));
    return system;
}

/// ZnS (O4) in wurtzite structure (triclinic cell)
fn get_znso4() -> SimpleSystem {
    let u = 3. / 8.;
    let c = f64::sqrt(1. / u);
    let cell = Matrix3::new([[0.5, -0.5 * f64::sqrt(3.0), 0.0], [0.5, 0.5 * f64::sqrt(3.0), 0.0], [0.0, 0.0, c]]);
    let mut system = SimpleSystem::new(SimulationCell::new(cell));
    system.add_particle(Vector3D::new(0.5, 0.5 / f64::sqrt(3.0), 0.0));
    system.add_particle(Vector3D::new(0.5, 0.5 / f64::sqrt(3.0), u * c));
    system.add_particle(Vector3D::new(0.5, -0.5 / f64::sqrt(3.0), 0.5 * c));
    system.add_particle(Vector3D::new(0.5, -0.5 / f64::sqrt(3.0), (0.5 + u) * c));
    return system;
}
