//! HTTP handlers, one module per resource.

pub mod admin;
pub mod storefront;
