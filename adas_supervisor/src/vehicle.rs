//! Vehicle-side collaborators behind narrow contracts: the bus-adapter
//! interface, the kinematic bicycle model, and a simulated adapter used by
//! tests and bring-up rigs.

pub mod interface;
pub mod model;
pub mod sim;

pub use interface::VehicleIo;
pub use model::VehicleModel;
pub use sim::{SimVehicle, SimVehicleHandle};
