//! Erudio application library
//!
//! People and books resources with hypermedia links, CSV/XLSX import and
//! export, file storage and a small arithmetic API.

pub mod app;
pub mod codec;
pub mod error;
pub mod links;
pub mod modules;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
pub use error::ServiceError;
