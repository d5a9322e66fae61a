use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};
use time::Duration;
use tower_sessions::{Expiry, Session};

use super::repo_types::User;

/// Key for storing the authenticated user's id in the session.
pub const SESSION_USER_ID_KEY: &str = "user_id";
const FLASHES_KEY: &str = "_flashes";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Danger,
    Warning,
    Success,
    Info,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// What the session layer needs to know about whoever is logging in.
pub trait SessionUser {
    fn is_authenticated(&self) -> bool;
    fn get_id(&self) -> Option<i64>;
}

impl SessionUser for User {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn get_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl SessionUser for AnonymousUser {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn get_id(&self) -> Option<i64> {
        None
    }
}

/// Authentication view over the request's tower-sessions session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    session: Session,
    remember_for: Duration,
}

impl AuthSession {
    pub const DEFAULT_REMEMBER: Duration = Duration::days(365);

    pub fn new(session: Session) -> Self {
        Self {
            session,
            remember_for: Self::DEFAULT_REMEMBER,
        }
    }

    pub fn with_remember_for(mut self, remember_for: Duration) -> Self {
        self.remember_for = remember_for;
        self
    }

    pub async fn user_id(&self) -> Result<Option<i64>, tower_sessions::session::Error> {
        self.session.get::<i64>(SESSION_USER_ID_KEY).await
    }

    pub async fn is_authenticated(&self) -> Result<bool, tower_sessions::session::Error> {
        Ok(self.user_id().await?.is_some())
    }

    /// Binds the session to `user`. A fresh session id is issued so a pre-login id
    /// cannot be reused. `remember` keeps the cookie alive across browser restarts.
    pub async fn login<U: SessionUser>(&self, user: &U, remember: bool) -> anyhow::Result<()> {
        let id = match user.get_id() {
            Some(id) if user.is_authenticated() => id,
            _ => anyhow::bail!("cannot log in an anonymous user"),
        };
        self.session.cycle_id().await?;
        self.session.insert(SESSION_USER_ID_KEY, id).await?;
        self.session.set_expiry(Some(if remember {
            Expiry::OnInactivity(self.remember_for)
        } else {
            Expiry::OnSessionEnd
        }));
        Ok(())
    }

    /// Destroys the session record; flashes added afterwards land in a new session.
    pub async fn logout(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.flush().await
    }

    pub async fn flash(&self, flash: Flash) -> Result<(), tower_sessions::session::Error> {
        let mut pending = self
            .session
            .get::<Vec<Flash>>(FLASHES_KEY)
            .await?
            .unwrap_or_default();
        pending.push(flash);
        self.session.insert(FLASHES_KEY, pending).await
    }

    pub async fn take_flashes(&self) -> Result<Vec<Flash>, tower_sessions::session::Error> {
        Ok(self
            .session
            .remove::<Vec<Flash>>(FLASHES_KEY)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let remember_for = parts
            .extensions
            .get::<RememberFor>()
            .map(|r| r.0)
            .unwrap_or(Self::DEFAULT_REMEMBER);
        Ok(Self::new(session).with_remember_for(remember_for))
    }
}

/// Request extension carrying the configured remember-me lifetime.
#[derive(Debug, Clone, Copy)]
pub struct RememberFor(pub Duration);
