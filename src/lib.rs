pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod upstream;
