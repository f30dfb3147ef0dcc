use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Refresh {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Logout {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl From<crate::domain::auth_session::AuthSession> for AuthSession {
    fn from(session: crate::domain::auth_session::AuthSession) -> Self {
        Self { token: session.token, refresh_token: session.refresh_token, expires_at: session.expires_at }
    }
}
