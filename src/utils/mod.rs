//! Numeric helpers shared by the interpreters and the simulated devices.

pub mod safe_cast;
