//! Token validation for the authentication collaborator.
//!
//! Token issuance (login, refresh) is handled by a separate service;
//! this backend only validates incoming bearer tokens and trusts the
//! caller identity they carry.

pub mod jwt;
