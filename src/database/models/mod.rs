pub mod user;

pub use user::{User, UserPreferences, UserSummary};
