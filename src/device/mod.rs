//! Device identity generation
//!
//! Derives a stable synthetic phone (hardware string, ids, build) from a seed
//! so the same account keeps presenting as the same device across restarts.

pub mod catalog;
pub mod descriptor;
pub mod generator;

pub use descriptor::DeviceDescriptor;
pub use generator::{DeviceProfile, seeded_guid, seeded_rng};
