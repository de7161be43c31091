#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// image filtering module.
pub mod filter;

/// histogram stretching and counting module.
pub mod histogram;

/// module containing parallization utilities.
pub mod parallel;
