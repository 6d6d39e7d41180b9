pub mod api;
pub mod availability;
pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod pg;
pub mod schema;
pub mod store;
