use std::sync::Arc;

use tracing::{info, warn};

use super::{
    forms::{normalize_email, FieldErrors, LoginForm, RegisterForm, ResetPasswordForm, ResetRequestForm},
    password::PasswordHasher,
    redirect::safe_next,
    repo::{StoreError, UserStore},
    repo_types::User,
    session::{AuthSession, Flash, FlashCategory},
    tokens::ResetTokenCodec,
};
use crate::{error::AppError, mail::{templates, MailDispatcher}};

pub const INDEX: &str = "/";
pub const LOGIN: &str = "/login";

const MSG_REGISTERED: &str = "Congratulations, you are now a registered user!";
const MSG_EMAIL_TAKEN: &str = "Please use a different email address.";
const MSG_BAD_CREDENTIALS: &str = "Invalid username or password";
const MSG_LOGGED_IN: &str = "Successfully logged in";
const MSG_LOGGED_OUT: &str = "Successfully logged out";
const MSG_CHECK_EMAIL: &str = "Check your email for the instructions to reset your password";
const MSG_BROKEN_LINK: &str = "Your password reset link is broken or expired";
const MSG_PASSWORD_RESET: &str = "Your password has been reset.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Register,
    Login,
    ResetRequest,
    ResetPassword { token: String },
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Register => "register",
            View::Login => "login",
            View::ResetRequest => "reset_password_request",
            View::ResetPassword { .. } => "reset_password",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Register => "Register",
            View::Login => "Sign In",
            View::ResetRequest | View::ResetPassword { .. } => "Reset Password",
        }
    }
}

/// A form page, possibly carrying validation errors from a rejected submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub view: View,
    pub errors: FieldErrors,
}

impl Page {
    pub fn new(view: View) -> Self {
        Self {
            view,
            errors: FieldErrors::default(),
        }
    }

    pub fn with_errors(view: View, errors: FieldErrors) -> Self {
        Self { view, errors }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Redirect(String),
    Render(Page),
}

impl AuthOutcome {
    fn redirect(to: &str) -> Self {
        AuthOutcome::Redirect(to.to_string())
    }
}

/// The five user-facing auth operations, wired to explicitly injected collaborators.
pub struct AuthController {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: ResetTokenCodec,
    mailer: MailDispatcher,
    base_url: String,
}

impl AuthController {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: ResetTokenCodec,
        mailer: MailDispatcher,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            mailer,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolves the session to a user. A session whose user vanished is anonymous.
    pub async fn current_user(&self, session: &AuthSession) -> Result<Option<User>, AppError> {
        match session.user_id().await? {
            Some(id) => Ok(self.users.find_by_id(id).await?),
            None => Ok(None),
        }
    }

    pub async fn register(
        &self,
        session: &AuthSession,
        mut form: RegisterForm,
    ) -> Result<AuthOutcome, AppError> {
        form.email = normalize_email(&form.email);
        let mut errors = form.validate();
        if errors.get("email").is_none() && self.users.find_by_email(&form.email).await?.is_some() {
            errors.add("email", MSG_EMAIL_TAKEN);
        }
        if !errors.is_empty() {
            return Ok(AuthOutcome::Render(Page::with_errors(View::Register, errors)));
        }

        let hash = self.hasher.hash(&form.password)?;
        let user = match self.users.create(&form.email, &hash).await {
            Ok(user) => user,
            Err(StoreError::DuplicateEmail) => {
                warn!(email = %form.email, "concurrent registration lost the race");
                let mut errors = FieldErrors::default();
                errors.add("email", MSG_EMAIL_TAKEN);
                return Ok(AuthOutcome::Render(Page::with_errors(View::Register, errors)));
            }
            Err(e) => return Err(e.into()),
        };

        session.flash(Flash::new(FlashCategory::Success, MSG_REGISTERED)).await?;
        info!(user_id = user.id, email = %user.email, "registered new user");
        Ok(AuthOutcome::redirect(LOGIN))
    }

    pub async fn login(
        &self,
        session: &AuthSession,
        mut form: LoginForm,
        next: Option<&str>,
    ) -> Result<AuthOutcome, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(AuthOutcome::Render(Page::with_errors(View::Login, errors)));
        }
        form.email = normalize_email(&form.email);

        let user = match self.users.find_by_email(&form.email).await? {
            Some(user) if self.hasher.verify(&user.password_hash, &form.password) => user,
            found => {
                warn!(email = %form.email, known = found.is_some(), "login rejected");
                session.flash(Flash::new(FlashCategory::Danger, MSG_BAD_CREDENTIALS)).await?;
                return Ok(AuthOutcome::redirect(LOGIN));
            }
        };

        session.login(&user, form.remember()).await?;
        session.flash(Flash::new(FlashCategory::Success, MSG_LOGGED_IN)).await?;
        info!(user_id = user.id, email = %user.email, "user logged in");

        Ok(AuthOutcome::Redirect(
            safe_next(next).unwrap_or_else(|| INDEX.to_string()),
        ))
    }

    pub async fn logout(&self, session: &AuthSession) -> Result<AuthOutcome, AppError> {
        let user_id = session.user_id().await?;
        info!(user_id = ?user_id, "user logged out");
        session.logout().await?;
        session.flash(Flash::new(FlashCategory::Info, MSG_LOGGED_OUT)).await?;
        Ok(AuthOutcome::redirect(LOGIN))
    }

    /// Answers the same way whether or not the address is registered.
    pub async fn request_password_reset(
        &self,
        session: &AuthSession,
        mut form: ResetRequestForm,
    ) -> Result<AuthOutcome, AppError> {
        form.email = normalize_email(&form.email);
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(AuthOutcome::Render(Page::with_errors(View::ResetRequest, errors)));
        }

        let user = self.users.find_by_email(&form.email).await?;
        if let Some(user) = &user {
            self.send_password_reset_email(user)?;
        }

        session.flash(Flash::new(FlashCategory::Info, MSG_CHECK_EMAIL)).await?;
        info!(
            email = %form.email,
            user_id = ?user.as_ref().map(|u| u.id),
            "password reset requested"
        );
        Ok(AuthOutcome::redirect(LOGIN))
    }

    /// GET of a reset link: the form is only shown for a token that still resolves.
    pub async fn reset_password_page(
        &self,
        session: &AuthSession,
        token: &str,
    ) -> Result<AuthOutcome, AppError> {
        match self.verify_reset_token(token).await? {
            Some(_) => Ok(AuthOutcome::Render(Page::new(View::ResetPassword {
                token: token.to_string(),
            }))),
            None => self.broken_link(session).await,
        }
    }

    pub async fn reset_password(
        &self,
        session: &AuthSession,
        token: &str,
        form: ResetPasswordForm,
    ) -> Result<AuthOutcome, AppError> {
        let Some(user) = self.verify_reset_token(token).await? else {
            return self.broken_link(session).await;
        };

        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(AuthOutcome::Render(Page::with_errors(
                View::ResetPassword {
                    token: token.to_string(),
                },
                errors,
            )));
        }

        let hash = self.hasher.hash(&form.password)?;
        self.users.update_password(user.id, &hash).await?;
        session.flash(Flash::new(FlashCategory::Success, MSG_PASSWORD_RESET)).await?;
        info!(user_id = user.id, email = %user.email, "user reset password");
        Ok(AuthOutcome::redirect(LOGIN))
    }

    async fn verify_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.tokens.decode(token) else {
            return Ok(None);
        };
        let user = self.users.find_by_id(user_id).await?;
        if user.is_none() {
            warn!(user_id, "reset token subject no longer exists");
        }
        Ok(user)
    }

    async fn broken_link(&self, session: &AuthSession) -> Result<AuthOutcome, AppError> {
        session.flash(Flash::new(FlashCategory::Danger, MSG_BROKEN_LINK)).await?;
        Ok(AuthOutcome::redirect(INDEX))
    }

    fn send_password_reset_email(&self, user: &User) -> anyhow::Result<()> {
        let token = self.tokens.encode(user.id)?;
        let link = format!("{}/reset_password/{}", self.base_url, token);
        let body = templates::reset_password(user, &link);
        self.mailer.send(
            templates::RESET_PASSWORD_SUBJECT,
            user.email.as_str(),
            body.text,
            body.html,
        );
        Ok(())
    }
}
