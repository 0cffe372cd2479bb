//! libris — a cache-coherent REST API for a small library catalog.
//!
//! Two resources (authors and the books they own) over Postgres, with
//! page/limit pagination, a tag-scoped response cache, role-gated mutation
//! endpoints, and hypermedia links.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
