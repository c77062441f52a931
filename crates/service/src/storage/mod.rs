//! Storage abstractions for the service layer
//!
//! Contains the reusable file-backed list store that persists small ordered
//! collections as pretty-printed JSON arrays.

pub mod json_list_store;
