pub mod record;
pub mod table;
pub mod utils;

// Re-export handler functions for use in routing
pub use record::{remove, show, update};
pub use table::{create, list};
