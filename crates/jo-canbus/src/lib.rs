//! J1939 decode-and-integrate engine.
//!
//! Frames flow through [`j1939::classify`] and [`j1939::decode_frame`] into the
//! [`OdometerIntegrator`], which turns engine speed into distance travelled.

pub mod error;
pub mod interface;
pub mod j1939;
pub mod mock;
pub mod odometer;
pub mod types;

pub use error::{CanError, CanResult};
pub use interface::CanInterface;
#[cfg(target_os = "linux")]
pub use interface::SocketCanInterface;
pub use mock::MockCanInterface;
pub use odometer::{IntegratorState, OdometerIntegrator, SpeedModel};
pub use types::{CanFilter, CanFrame};
