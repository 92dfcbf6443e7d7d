// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth, /auth/*) → Protected (JWT auth, /api/*)
pub mod public;
pub mod protected;
