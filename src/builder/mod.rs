//! Native build backends.

pub mod cmake;

pub use cmake::CMakeBackend;
