//! Login against the configured credential pair.
//!
//! Tokens are opaque and nothing checks them later; operations are not
//! authorized per user.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::users::find_by_email;
use crate::commands::{CmdMessage, CmdResult};
use crate::config::AuthConfig;
use crate::error::{Result, StashError};
use crate::model::User;
use crate::store::DataStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

pub fn login<S: DataStore>(
    store: &S,
    auth: &AuthConfig,
    email: &str,
    password: &str,
) -> Result<CmdResult<Session>> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(StashError::invalid("Email and password are required"));
    }

    if !email.eq_ignore_ascii_case(&auth.email) || password != auth.password {
        tracing::warn!(email, "login rejected");
        return Err(StashError::AuthenticationFailed("invalid email or password".into()));
    }

    let user = find_by_email(store, email).ok_or_else(|| {
        StashError::AuthenticationFailed(format!("no user is registered as {}", email))
    })?;

    let session = Session {
        token: format!("stash_{}", Uuid::new_v4().simple()),
        token_type: "Bearer",
        expires_at: Utc::now() + Duration::minutes(auth.token_ttl_minutes),
        user,
    };

    tracing::info!(user = %session.user.id, "login succeeded");
    Ok(CmdResult::new(session.clone())
        .with_message(CmdMessage::success(format!("Welcome back, {}", session.user.name))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    fn auth() -> AuthConfig {
        AuthConfig {
            email: "ann@x.io".into(),
            password: "secret".into(),
            token_ttl_minutes: 30,
        }
    }

    #[test]
    fn valid_credentials_issue_bearer_token() {
        let store = StoreFixture::new().with_user("u1", "Ann", "ann@x.io").store;
        let session = login(&store, &auth(), "ANN@x.io", "secret").unwrap().data;

        assert!(session.token.starts_with("stash_"));
        assert_eq!(session.token.len(), "stash_".len() + 32);
        assert_eq!(session.token_type, "Bearer");
        assert_eq!(session.user.id, "u1");
        assert!(session.expires_at > Utc::now() + Duration::minutes(29));
    }

    #[test]
    fn wrong_password_is_401() {
        let store = StoreFixture::new().with_user("u1", "Ann", "ann@x.io").store;
        let err = login(&store, &auth(), "ann@x.io", "nope").unwrap_err();
        assert_eq!(err.status(), 401);
        assert_eq!(err.code().as_str(), "authentication_failed");
    }

    #[test]
    fn configured_email_without_user_fails() {
        let store = StoreFixture::new().store;
        assert_eq!(login(&store, &auth(), "ann@x.io", "secret").unwrap_err().status(), 401);
    }

    #[test]
    fn blank_input_is_invalid() {
        let store = StoreFixture::new().store;
        assert_eq!(login(&store, &auth(), " ", "secret").unwrap_err().status(), 400);
    }

    #[test]
    fn session_serializes_camel_case() {
        let store = StoreFixture::new().with_user("u1", "Ann", "ann@x.io").store;
        let session = login(&store, &auth(), "ann@x.io", "secret").unwrap().data;
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["tokenType"], "Bearer");
        assert!(json["expiresAt"].is_string());
    }
}
