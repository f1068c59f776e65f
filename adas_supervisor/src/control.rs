//! Actuator computation: longitudinal PI loop, the lateral controller
//! family, and the lag-adjusted path curvature helper feeding them.

pub mod lat;
pub mod long;
pub mod path;

pub use lat::{LatControl, LatOutput};
pub use long::LongControl;
pub use path::lag_adjusted_curvature;
