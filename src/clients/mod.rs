//! The Resource Client seam: [`ResourceApi`] and its HTTP implementation.

pub mod error;
pub mod http_client;
pub mod resource_api;

pub use error::*;
pub use http_client::*;
pub use resource_api::*;
