mod create_sql;
mod migrate;
mod plan;

pub use create_sql::{render_create_sql, run_create_sql};
pub use migrate::run_migrate;
pub use plan::{format_plan, run_plan};
