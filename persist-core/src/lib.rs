pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod introspect;
pub mod materialize;
pub mod migration;
pub mod model;
pub mod schema;
pub mod sql_type;
pub mod value;

pub use error::{PersistError, Result};
