// src/ingest/providers/mod.rs
pub mod fixed;
pub mod stream_page;
