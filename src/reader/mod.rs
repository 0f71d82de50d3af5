//! Read phase: resolve the desired state from the source directory and the
//! current state from the target endpoint.
//!
//! Both readers are read-only and independent; the coordinator issues them
//! concurrently and combines their outputs only after both complete.

pub mod source;
pub mod target;

pub use source::DirectoryReader;
pub use target::TargetStateReader;
