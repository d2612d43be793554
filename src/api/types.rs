//! Request and response types for the account endpoints.
//!
//! All structs use camelCase serialization to match the API's JSON format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login request body sent to POST user/login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response. The backend has shipped the token under several names
/// over time, so all of them are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "token", alias = "access_token")]
    pub access_token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Body for POST user/forgotPassword.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body for POST user/validateOtp.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Body for POST user/resetPassword.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
}
