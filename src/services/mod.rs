//! Domain services: path handling, retries, folder projection, the listing
//! cache, the object-store gateways and the catalog that ties them together.

pub mod catalog_service;
pub mod folder_projector;
pub mod listing_cache;
pub mod object_store;
pub mod path_sanitizer;
pub mod retry;
