//! Printworks: backend for a 3D-printing studio's marketing site.
//!
//! Layered layout: `domain` holds pure types and validation, `cache` the
//! TTL slot primitive, `application` the services orchestrating them, and
//! `infra` the HTTP surface plus upstream clients (Google Places reviews,
//! transactional mail, the on-disk content store).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
