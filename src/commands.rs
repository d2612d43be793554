//! CLI command handlers.
//!
//! Each handler drives the API client and reports failures as a
//! human-readable string; the client has already shown any toast the
//! failure called for.

use reqwest::Method;
use serde_json::Value;

use crate::api::types::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, ValidateOtpRequest,
};
use crate::api::{account, RequestDescriptor};
use crate::state::AppState;

/// Log in with email and password and persist the session.
pub async fn login(state: &AppState, email: String, password: String) -> Result<(), String> {
    log::info!("Logging in as {}", email);

    let request = LoginRequest { email, password };
    let response = account::login_and_store(&state.api, &request).await?;

    match response.user.as_ref().and_then(display_name) {
        Some(name) => println!("Logged in as {}", name),
        None => println!("Logged in"),
    }
    Ok(())
}

/// Clear the local session.
pub async fn logout(state: &AppState) -> Result<(), String> {
    state
        .session
        .logout()
        .map_err(|e| format!("Failed to clear session: {}", e))?;
    println!("Logged out");
    Ok(())
}

/// Print the local session state without contacting the server.
pub fn status(state: &AppState) -> Result<(), String> {
    println!("Session: {}", state.session.status().label());
    if let Some(user) = state.session.current_user() {
        let name = display_name(&user).unwrap_or_else(|| user.to_string());
        println!("User: {}", name);
    }
    Ok(())
}

pub async fn profile(state: &AppState) -> Result<(), String> {
    let profile = account::get_profile(&state.api)
        .await
        .map_err(|e| format!("Profile fetch failed: {}", e))?;
    print_json(&profile)
}

pub async fn forgot_password(state: &AppState, email: String) -> Result<(), String> {
    let response = account::forgot_password(&state.api, &ForgotPasswordRequest { email })
        .await
        .map_err(|e| format!("Password recovery failed: {}", e))?;
    print_json(&response)
}

pub async fn validate_otp(state: &AppState, email: String, otp: String) -> Result<(), String> {
    let response = account::validate_otp(&state.api, &ValidateOtpRequest { email, otp })
        .await
        .map_err(|e| format!("OTP validation failed: {}", e))?;
    print_json(&response)
}

pub async fn reset_password(
    state: &AppState,
    request: ResetPasswordRequest,
) -> Result<(), String> {
    let response = account::reset_password(&state.api, &request)
        .await
        .map_err(|e| format!("Password reset failed: {}", e))?;
    print_json(&response)
}

/// Send an arbitrary request through the client and print the body.
pub async fn raw_request(
    state: &AppState,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> Result<(), String> {
    let method = parse_method(method)?;
    let payload: Value = match data {
        Some(raw) => serde_json::from_str(raw).map_err(|e| format!("Invalid --data JSON: {}", e))?,
        None => Value::Null,
    };

    let response = match method.clone() {
        Method::GET => state.api.get(path).await,
        Method::POST => state.api.post(path, &payload).await,
        Method::PUT => state.api.put(path, &payload).await,
        Method::PATCH => state.api.patch(path, &payload).await,
        Method::DELETE => state.api.delete(path, &payload).await,
        other => {
            let descriptor = RequestDescriptor::new(other, path)
                .with_payload(&payload)
                .map_err(|e| e.to_string())?;
            state.api.request(descriptor).await
        }
    }
    .map_err(|e| format!("{} {} failed: {}", method, path, e))?;

    print_json(&response)
}

fn parse_method(method: &str) -> Result<Method, String> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("Invalid HTTP method: {}", method))
}

fn print_json(value: &Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to render response: {}", e))?;
    println!("{}", text);
    Ok(())
}

/// Friendly name from a user profile: full name, then email.
fn display_name(user: &Value) -> Option<String> {
    let first = user.get("firstName").and_then(Value::as_str);
    let last = user.get("lastName").and_then(Value::as_str);
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
        (Some(f), None) => Some(f.to_string()),
        _ => user
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
