use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppResult, FieldErrors};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Normalizes the email in place and checks the input before any
    /// handler logic runs.
    pub fn validate(&mut self) -> AppResult<()> {
        self.email = self.email.trim().to_lowercase();
        let mut errors = FieldErrors::default();
        if !is_valid_email(&self.email) {
            errors.push("email", "must be a valid email address");
        }
        if self.password.len() < 6 {
            errors.push("password", "must be at least 6 characters");
        }
        errors.into_result()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&mut self) -> AppResult<()> {
        self.email = self.email.trim().to_lowercase();
        let mut errors = FieldErrors::default();
        if !is_valid_email(&self.email) {
            errors.push("email", "must be a valid email address");
        }
        errors.into_result()
    }
}

/// Public part of the user returned to clients. The password hash never
/// appears here.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}
