// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here receives the `AuthUser` inserted by `jwt_auth_middleware`
// and operates only on that user's schema.
pub mod auth;
pub mod data;
pub mod notes;
pub mod preferences;
pub mod workouts;
