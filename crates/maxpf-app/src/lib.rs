// Library root: the runnable shell around the engine crate, exposed so the
// binary and integration tests share one API.

pub mod config;
pub mod db;
pub mod ingest;
pub mod migration;
pub mod pipeline;
pub mod source;
