//! Data acquisition and storage
//!
//! Kaisen API client, dataset assembly, and the CSV snapshot store.

pub mod api;
pub mod assemble;
pub mod store;
pub mod table;

pub use store::TabularStore;
pub use table::{Cell, Table};
