//! Domain layer for the chantier construction-tracking backend.
//!
//! Pure types, constants, and validation/progress rules shared by the DB
//! and API layers. No database or HTTP dependency.

pub mod error;
pub mod project;
pub mod steps;
pub mod types;
