//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chantier_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Credential storage is handled by the authentication service; this
/// backend only keeps the display fields that project responses resolve
/// owner/architect/constructor references against.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Display summary embedded in project responses in place of a raw user id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSummary {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
