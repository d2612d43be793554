//! Account endpoints: login, password recovery and profile.
//!
//! Thin typed wrappers over [`ApiClient`]; failures keep the client's
//! classification and side effects.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest, ValidateOtpRequest,
};

/// POST user/login. Does not touch the session; see [`login_and_store`].
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
    let body = client.post("user/login", request).await?;
    decode_enveloped(body)
}

/// Log in and persist the returned credential and profile.
pub async fn login_and_store(
    client: &ApiClient,
    request: &LoginRequest,
) -> Result<LoginResponse, String> {
    let response = login(client, request)
        .await
        .map_err(|e| format!("Login failed: {}", e))?;

    client
        .start_session(&response.access_token, response.user.as_ref())
        .await
        .map_err(|e| format!("Failed to store session: {}", e))?;

    Ok(response)
}

/// POST user/forgotPassword.
pub async fn forgot_password(
    client: &ApiClient,
    request: &ForgotPasswordRequest,
) -> Result<Value, ApiError> {
    client.post("user/forgotPassword", request).await
}

/// POST user/validateOtp.
pub async fn validate_otp(
    client: &ApiClient,
    request: &ValidateOtpRequest,
) -> Result<Value, ApiError> {
    client.post("user/validateOtp", request).await
}

/// POST user/resetPassword.
pub async fn reset_password(
    client: &ApiClient,
    request: &ResetPasswordRequest,
) -> Result<Value, ApiError> {
    client.post("user/resetPassword", request).await
}

/// GET user/get. Returns the profile payload as sent.
pub async fn get_profile(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("user/get").await
}

/// Decode `T` from the body, or from its `data` field when wrapped.
fn decode_enveloped<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let direct_err = match serde_json::from_value::<T>(body.clone()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    if let Some(inner) = body.get("data") {
        if let Ok(value) = serde_json::from_value::<T>(inner.clone()) {
            return Ok(value);
        }
    }
    Err(ApiError::decode(
        None,
        format!("Unexpected response shape: {}", direct_err),
    ))
}
