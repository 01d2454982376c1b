//! Session context threaded through the intake flow, API client and report.
//!
//! Sign-in and sign-out are delegated to an external identity provider; this
//! module only keeps the resulting profile and bearer token, and persists both
//! under their storage keys so a restart restores the session.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::db::{Database, DbError, TOKEN_KEY, USER_KEY};
use crate::models::{Session, UserProfile};

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// External identity provider boundary.
pub trait IdentityProvider {
    /// Currently signed-in user, if any.
    fn current_user(&self) -> Option<UserProfile>;
}

/// What a stored bearer token looks like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Expired,
    Malformed,
}

#[derive(Deserialize)]
struct JwtClaims {
    exp: Option<i64>,
}

/// Inspect a bearer token. Opaque (non-JWT) tokens are treated as valid.
pub fn inspect_token(token: &str, now: DateTime<Utc>) -> TokenState {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() == 1 {
        return TokenState::Valid;
    }
    if parts.len() != 3 {
        return TokenState::Malformed;
    }

    let claims: JwtClaims = match URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(claims) => claims,
        None => return TokenState::Malformed,
    };

    match claims.exp {
        Some(exp) if exp < now.timestamp() => TokenState::Expired,
        _ => TokenState::Valid,
    }
}

/// Explicitly passed session state with an init/teardown lifecycle.
pub struct SessionContext {
    db: Arc<Mutex<Database>>,
    user: Option<UserProfile>,
    token: Option<String>,
}

impl SessionContext {
    /// Restore a session from storage.
    ///
    /// A corrupt profile or an expired/malformed token tears the session down.
    pub fn init(db: Arc<Mutex<Database>>) -> SessionResult<Self> {
        let (user, token) = {
            let guard = db.lock().map_err(|_| SessionError::LockPoisoned)?;
            let user = match guard.get_json::<UserProfile>(USER_KEY) {
                Ok(user) => user,
                Err(DbError::Json(e)) => {
                    tracing::warn!(error = %e, "Stored user profile is unreadable, signing out");
                    None
                }
                Err(e) => return Err(e.into()),
            };
            (user, guard.get_item(TOKEN_KEY)?)
        };

        let mut ctx = Self { db, user, token };

        if let Some(token) = ctx.token.as_deref() {
            let state = inspect_token(token, Utc::now());
            if state != TokenState::Valid {
                tracing::info!(?state, "Discarding stored session token");
                ctx.teardown()?;
            }
        }

        Ok(ctx)
    }

    /// Anonymous context over the given storage (nothing restored).
    pub fn anonymous(db: Arc<Mutex<Database>>) -> Self {
        Self {
            db,
            user: None,
            token: None,
        }
    }

    /// Record a successful sign-in.
    pub fn sign_in(&mut self, user: UserProfile, token: Option<String>) -> SessionResult<()> {
        {
            let guard = self.db.lock().map_err(|_| SessionError::LockPoisoned)?;
            guard.set_json(USER_KEY, &user)?;
            match token.as_deref() {
                Some(t) => guard.set_item(TOKEN_KEY, t)?,
                None => {
                    guard.remove_item(TOKEN_KEY)?;
                }
            }
        }
        tracing::info!(has_token = token.is_some(), "Session started");
        self.user = Some(user);
        self.token = token;
        Ok(())
    }

    /// Re-sync with the identity provider: a missing user ends the session.
    pub fn refresh_from(&mut self, provider: &dyn IdentityProvider) -> SessionResult<()> {
        match provider.current_user() {
            Some(user) => {
                if self.user.as_ref() != Some(&user) {
                    let token = self.token.take();
                    self.sign_in(user, token)?;
                }
                Ok(())
            }
            None => self.teardown(),
        }
    }

    /// Clear profile and token, in memory and in storage.
    pub fn teardown(&mut self) -> SessionResult<()> {
        self.user = None;
        self.token = None;
        let guard = self.db.lock().map_err(|_| SessionError::LockPoisoned)?;
        guard.remove_item(TOKEN_KEY)?;
        guard.remove_item(USER_KEY)?;
        tracing::info!("Session torn down");
        Ok(())
    }

    /// Identity view consumed by the rest of the client.
    pub fn session(&self) -> Session {
        Session {
            is_signed_in: self.user.is_some(),
            display_name: self.user.as_ref().and_then(UserProfile::display_name),
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    fn shared_db() -> Arc<Mutex<Database>> {
        Arc::new(Mutex::new(Database::open_in_memory().unwrap()))
    }

    struct FixedProvider(Option<UserProfile>);

    impl IdentityProvider for FixedProvider {
        fn current_user(&self) -> Option<UserProfile> {
            self.0.clone()
        }
    }

    #[test]
    fn test_inspect_token() {
        let now = Utc::now();
        assert_eq!(inspect_token("opaque-token", now), TokenState::Valid);
        assert_eq!(inspect_token(&jwt_with_exp(now.timestamp() + 60), now), TokenState::Valid);
        assert_eq!(inspect_token(&jwt_with_exp(now.timestamp() - 60), now), TokenState::Expired);
        assert_eq!(inspect_token("a.b", now), TokenState::Malformed);
        assert_eq!(inspect_token("a.!!!.c", now), TokenState::Malformed);
    }

    #[test]
    fn test_sign_in_persists_and_restores() {
        let db = shared_db();
        let mut ctx = SessionContext::init(db.clone()).unwrap();
        assert!(!ctx.session().is_signed_in);

        ctx.sign_in(UserProfile::with_full_name("Asha Rao"), Some("tok".into()))
            .unwrap();

        let restored = SessionContext::init(db).unwrap();
        assert_eq!(restored.session().display_name.as_deref(), Some("Asha Rao"));
        assert_eq!(restored.bearer_token(), Some("tok"));
    }

    #[test]
    fn test_expired_token_is_torn_down_on_init() {
        let db = shared_db();
        {
            let mut ctx = SessionContext::anonymous(db.clone());
            ctx.sign_in(
                UserProfile::with_full_name("Asha Rao"),
                Some(jwt_with_exp(Utc::now().timestamp() - 10)),
            )
            .unwrap();
        }

        let ctx = SessionContext::init(db.clone()).unwrap();
        assert!(!ctx.session().is_signed_in);
        assert_eq!(ctx.bearer_token(), None);
        assert_eq!(db.lock().unwrap().get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_refresh_from_provider() {
        let db = shared_db();
        let mut ctx = SessionContext::anonymous(db);

        ctx.refresh_from(&FixedProvider(Some(UserProfile::with_full_name("Sam Lee"))))
            .unwrap();
        assert!(ctx.session().is_signed_in);

        ctx.refresh_from(&FixedProvider(None)).unwrap();
        assert_eq!(ctx.session(), Session::anonymous());
    }
}
