//! Account endpoints: authentication, profile, availability checks, public
//! info, and the wallet (the platform's virtual currency, confusingly also
//! named "token" on the wire; unrelated to the auth bearer token).

use crate::api::Ack;
use crate::error::Error;
use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The authenticated user record as returned by the server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub date_joined: Option<String>,
}

/// Publicly visible subset of another user's record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub qqid: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub qqid: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Partial profile update; absent fields are left untouched by the server.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Envelope shared by login, register, and profile updates. `token` is the
/// bearer credential; deployments running on cookie sessions omit it.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AvailabilityResponse {
    pub success: bool,
    pub available: bool,
}

/// Wallet balance; `token` is the virtual-currency amount.
#[derive(Clone, Debug, Deserialize)]
pub struct WalletBalance {
    pub success: bool,
    pub user_id: i64,
    pub username: String,
    pub token: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WalletChange {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub old_token: i64,
    pub new_token: i64,
    #[serde(default)]
    pub amount_changed: Option<i64>,
}

/// # Errors
/// Propagates the gateway failure.
pub async fn login(gateway: &Gateway, request: &LoginRequest) -> Result<AuthResponse, Error> {
    gateway.post("/users/login/", request).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn register(gateway: &Gateway, request: &RegisterRequest) -> Result<AuthResponse, Error> {
    gateway.post("/users/register/", request).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn logout(gateway: &Gateway) -> Result<Ack, Error> {
    gateway.post("/users/logout/", &json!({})).await
}

/// Bare user record, no envelope.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn current_user(gateway: &Gateway) -> Result<User, Error> {
    gateway.get("/users/me/").await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn update_profile(
    gateway: &Gateway,
    update: &ProfileUpdate,
) -> Result<AuthResponse, Error> {
    gateway.put("/users/profile/", update).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn change_password(
    gateway: &Gateway,
    request: &ChangePasswordRequest,
) -> Result<Ack, Error> {
    gateway.post("/users/change-password/", request).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn check_username(
    gateway: &Gateway,
    username: &str,
) -> Result<AvailabilityResponse, Error> {
    gateway
        .post("/users/check-username/", &json!({ "username": username }))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn check_email(gateway: &Gateway, email: &str) -> Result<AvailabilityResponse, Error> {
    gateway
        .post("/users/check-email/", &json!({ "email": email }))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn check_qqid(gateway: &Gateway, qqid: &str) -> Result<AvailabilityResponse, Error> {
    gateway
        .post("/users/check-qqid/", &json!({ "qqid": qqid }))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn public_info(gateway: &Gateway, user_id: i64) -> Result<PublicUser, Error> {
    gateway.get(&format!("/users/{user_id}/public/")).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn wallet_balance(gateway: &Gateway) -> Result<WalletBalance, Error> {
    gateway.get("/users/token/").await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn set_wallet(gateway: &Gateway, token: i64) -> Result<WalletChange, Error> {
    gateway
        .post("/users/token/update/", &json!({ "token": token }))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn add_wallet(gateway: &Gateway, amount: i64) -> Result<WalletChange, Error> {
    gateway
        .post("/users/token/add/", &json!({ "amount": amount }))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn deduct_wallet(gateway: &Gateway, amount: i64) -> Result<WalletChange, Error> {
    gateway
        .post("/users/token/deduct/", &json!({ "amount": amount }))
        .await
}
