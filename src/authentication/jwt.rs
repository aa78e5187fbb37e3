use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{Id, User};
use crate::error::Error;
use crate::schema::UserRole;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            username: value.username,
            user_id: value.user_id,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, Error> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(format!("Invalid session secret: {e}")))
}

pub fn generate_jwt_session(user: &User, secret: &str, lifetime: Duration) -> Result<String, Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        lifetime,
    );

    claims
        .sign_with_key(&key)
        .map_err(|e| Error::Internal(format!("Failed to sign session: {e}")))
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, Error> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| Error::Unauthorized("Invalid token.".to_owned()))?;

    let now = Utc::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(Error::Unauthorized("Token expired.".to_owned()));
    }

    Ok(session)
}
