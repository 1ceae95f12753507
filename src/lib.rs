//! Show identity resolution and recommendation ranking
//!
//! Any reference to a show resolves to one canonical, persisted record.
//! Catalog shows are enriched with artwork and keywords from secondary
//! providers, and candidate pools are filtered, scored and ranked against a
//! seed show.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
