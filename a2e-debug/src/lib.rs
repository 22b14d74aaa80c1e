//! Debugger-facing introspection: side-effect-free memory reads and
//! soft-switch state dumps. No disassembler and no interactive front-end —
//! 65C02 decoding and a debugger UI are out of scope (spec §1).

pub mod inspector;

pub use inspector::Inspector;
