//! Together Apart: a relationship-maintenance server for long-distance
//! couples. Domain models and storage live in `together-core`; this crate
//! adds the HTTP surface, the LLM collaborator, and the image store.

pub mod api;
pub mod llm;
pub mod storage;
