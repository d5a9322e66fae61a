use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    controller::AuthController, password::PasswordHasher, repo::PgUserStore,
    tokens::ResetTokenCodec,
};
use crate::config::AppConfig;
use crate::mail::{MailDispatcher, MailTransport, MailWorkers, SmtpMailTransport};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthController>,
}

impl FromRef<AppState> for Arc<AuthController> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Builds every collaborator in dependency order: database, mail transport and
    /// workers, then the controller. The signing secret was already checked by
    /// [`AppConfig::from_env`]. Must run inside the tokio runtime.
    pub async fn init(config: Arc<AppConfig>) -> anyhow::Result<(Self, MailWorkers)> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let transport = Arc::new(SmtpMailTransport::new(&config.mail).context("smtp transport")?)
            as Arc<dyn MailTransport>;
        let (mailer, workers) = MailDispatcher::start(
            transport,
            config.mail.sender.clone(),
            config.mail.workers,
            config.mail.queue_capacity,
        );

        let tokens = ResetTokenCodec::new(
            config.secret(),
            time::Duration::seconds(config.reset_token_ttl_secs),
        );
        let auth = Arc::new(AuthController::new(
            Arc::new(PgUserStore::new(db)),
            PasswordHasher::new(),
            tokens,
            mailer,
            config.base_url.clone(),
        ));

        Ok((Self { config, auth }, workers))
    }

    pub fn from_parts(config: Arc<AppConfig>, auth: Arc<AuthController>) -> Self {
        Self { config, auth }
    }
}
