//! Sync layer: pulls pool definitions and draw history from the vendor API.

pub mod http;

pub use http::{AuthorizedQuery, GachaClient, SyncError};
