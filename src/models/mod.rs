pub mod db_model;
mod de;
pub mod queries;
pub mod upstream_model;

pub use db_model::*;
pub use upstream_model::*;
