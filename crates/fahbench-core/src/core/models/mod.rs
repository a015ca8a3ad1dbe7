pub mod integrator;
pub mod state;
pub mod system;
pub mod workunit;
