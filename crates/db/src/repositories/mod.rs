//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` (or a transaction, where a method participates in
//! the allocation serialization point) as the first argument.

pub mod allocation_attempt_repo;
pub mod flash_sale_repo;
pub mod offer_repo;

pub use allocation_attempt_repo::AllocationAttemptRepo;
pub use flash_sale_repo::FlashSaleRepo;
pub use offer_repo::{is_lock_contention, OfferRepo};
