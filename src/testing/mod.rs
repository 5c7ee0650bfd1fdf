//! Testing utilities for tethercam.
//!
//! Provides the simulated camera backend used by the test suite and by
//! untethered development builds (no libgphoto2 on the host).

pub mod simulated;

pub use simulated::{FailSite, SimLink, SimulatedCamera, WriteRecord};
