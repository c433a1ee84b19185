pub mod states;
pub mod params;
pub mod error;
pub mod forces;
pub mod systems;
pub mod trajectory;
pub mod integrator;
pub mod frames;
pub mod scenario;
