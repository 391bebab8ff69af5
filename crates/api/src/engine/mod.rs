//! The flash-sale engine services: the allocation controller and the
//! homepage aggregator.

pub mod allocator;
pub mod homepage;
