//! Filter operations
//!
//! This module provides the kernel types and the correlation engines.

/// Filter kernels
pub mod kernels;

mod kernel;
pub use kernel::*;

/// Per channel 2d correlation
mod correlation;
pub use correlation::*;

/// Joint channel 3d correlation
mod correlation3d;
pub use correlation3d::*;
