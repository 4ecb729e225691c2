use cutoff_neighbors::{CutoffNeighborFinder, FinderParameters, NeighborList};
use cutoff_neighbors::{SimpleSystem, SimulationCell, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let parameters = match std::env::args().nth(1) {
        Some(json) => FinderParameters::from_json(&json)?,
        None => FinderParameters::new(5.0),
    };

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    let system = fcc_crystal(12, 3.6);
    let list = time_graph::spanned!("Full calculation", {
        let finder = CutoffNeighborFinder::from_system(&parameters, &system)?;
        NeighborList::new(&finder)
    });
    println!("found {} pairs for {} particles", list.pairs().len(), list.len());

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Create a periodic fcc crystal with `n x n x n` conventional cells of side
/// `lattice`
fn fcc_crystal(n: usize, lattice: f64) -> SimpleSystem {
    let basis = [
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(0.0, 0.5, 0.5),
        Vector3D::new(0.5, 0.0, 0.5),
        Vector3D::new(0.5, 0.5, 0.0),
    ];

    let mut system = SimpleSystem::new(SimulationCell::cubic(n as f64 * lattice));
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let corner = Vector3D::new(i as f64, j as f64, k as f64);
                for &position in &basis {
                    system.add_particle((corner + position) * lattice);
                }
            }
        }
    }
    return system;
}
