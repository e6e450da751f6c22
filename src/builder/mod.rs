//! Code generation.
//!
//! The generator is an external tool; this module only builds its command
//! lines and runs them.

pub mod protoc;

pub use protoc::{generator_args, output_flag, ProtocGenerator};
