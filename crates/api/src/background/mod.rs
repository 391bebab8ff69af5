//! Long-running maintenance tasks spawned from `main`.

pub mod attempt_retention;
