pub mod account;
pub mod whoami;

pub use account::delete_account;
pub use whoami::whoami;
