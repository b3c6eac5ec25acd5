//! Site counts: a cached dashboard fragment listing per-type publish counts
//! and a filtered selection of recent items.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
