//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password hashing (Argon2id)
//! - JWT access tokens
//! - Bearer token extraction

pub mod bearer;
pub mod jwt;
pub mod password;
