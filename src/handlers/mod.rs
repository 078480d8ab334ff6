//! HTTP handlers for generic item CRUD and table description.

pub mod items;
pub mod tables;
pub use items::*;
pub use tables::*;
