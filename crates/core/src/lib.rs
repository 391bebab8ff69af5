//! Pure domain logic for the flash-sale engine.
//!
//! This crate has zero internal deps so it can be used by both the
//! repository layer and the API crate (and any future worker or CLI
//! tooling). Nothing here touches the database or the network: the
//! allocation preconditions, status resolution, and creation-time
//! validation are all total functions over plain values.

pub mod allocation;
pub mod clock;
pub mod error;
pub mod sale;
pub mod status;
pub mod timeslot;
pub mod types;
