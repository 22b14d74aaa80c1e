//! Machine assembly: wires the bus fabric, soft-switch controllers and
//! scheduler from `a2e-bus`/`a2e-core` into a running Apple IIe.

pub mod config;
pub mod machine;

pub use config::MachineConfig;
pub use machine::Machine;
