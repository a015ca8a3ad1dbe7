use crate::core::io::serialization::save_object;
use crate::core::models::integrator::Integrator;
use crate::core::models::state::{State, Vec3};
use crate::core::models::system::{Force, LennardJonesParams, System};
use crate::core::models::workunit::{MANIFEST_FILE_NAME, WorkUnit, WorkUnitManifest};
use std::fs;
use std::path::Path;

pub const ATOMS: usize = 4;

/// Writes a four-atom argon chain work unit to `<root>/<codename>/`.
pub fn write_work_unit(root: &Path, codename: &str, step_chunk: u32) -> WorkUnit {
    let dir = root.join(codename);
    fs::create_dir_all(&dir).unwrap();
    let params = LennardJonesParams {
        sigma: 0.34,
        epsilon: 0.99,
    };
    let system = System::new(vec![39.9; ATOMS]).with_force(Force::Nonbonded {
        particles: vec![params; ATOMS],
        cutoff: Some(1.0),
        exclusions: vec![],
    });
    let positions = (0..ATOMS)
        .map(|i| Vec3::new(0.4 * i as f64, 0.0, 0.0))
        .collect();
    let state = State::initial(positions, vec![Vec3::zeros(); ATOMS]);
    save_object(&dir.join("system.toml"), &system).unwrap();
    save_object(&dir.join("state.toml"), &state).unwrap();
    save_object(&dir.join("integrator.toml"), &Integrator::verlet(0.002)).unwrap();
    let manifest = WorkUnitManifest {
        codename: None,
        name: "Argon chain".to_string(),
        description: "Four argon atoms on a line".to_string(),
        step_chunk,
        atoms: ATOMS,
        system: None,
        integrator: None,
        state: None,
    };
    save_object(&dir.join(MANIFEST_FILE_NAME), &manifest).unwrap();
    WorkUnit::from_directory(&dir).unwrap()
}
