pub mod list_packages;
pub mod query;
pub mod repl;
pub mod schema;
