//! API DTOs (Data Transfer Objects)
//!
//! Request fields are optional so that a missing field is reported the
//! same way as a blank one.

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Certificate, User};
use crate::domain::value_object::role::Role;

/// `{"data": ...}` envelope used by every success body except login
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ============================================================================
// Current User
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub certificates: Vec<CertificateResponse>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.get()),
            first_name: user.name.as_str().to_string(),
            last_name: user.surname.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            is_active: user.is_active,
            certificates: user
                .certificates
                .into_iter()
                .map(CertificateResponse::from)
                .collect(),
        }
    }
}

// ============================================================================
// Certificates
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseRequest {
    pub name: Option<String>,
    pub price: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateResponse {
    pub id: Option<i64>,
    pub name: String,
    pub price: i32,
}

impl From<Certificate> for CertificateResponse {
    fn from(certificate: Certificate) -> Self {
        Self {
            id: certificate.id.map(|id| id.get()),
            name: certificate.name,
            price: certificate.price,
        }
    }
}
