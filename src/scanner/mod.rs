//! Share scanning: recursive image walker and batch discovery.

pub mod batches;
pub mod walker;
