pub mod types;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use error::FilterError;
pub use types::*;
