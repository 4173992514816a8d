// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, mounted under /c/*)
pub mod public;    // Service info and health
pub mod protected; // Book reads and rating mutations
