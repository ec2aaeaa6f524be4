//! Backend-independent services shared by the clients and the tool layer

pub mod id_resolver;
pub mod normalizer;

pub use id_resolver::{shorten_device_id, ThermostatIdResolver};
