//! Analysis modules.
//!
//! Derived statistics computed over a normalized report.

pub mod aggregator;

pub use aggregator::*;
