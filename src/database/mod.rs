pub mod identifier;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod registry;
pub mod topology;

pub use identifier::{LogicalTable, TenantSchema};
pub use manager::{DatabaseError, DatabaseManager};
pub use query_builder::QueryBuilder;
