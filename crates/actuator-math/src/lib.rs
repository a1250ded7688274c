//! Mathematical primitives for SCPN Actuator Core.

pub mod frame;
pub mod kernel;
pub mod polar;
