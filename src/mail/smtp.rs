use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

use super::dispatcher::{MailTransport, OutgoingMail};
use crate::config::MailConfig;

/// SMTP delivery. `use_ssl` selects implicit TLS, `use_tls` STARTTLS, neither a
/// plaintext connection.
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let builder = if cfg.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.server)
                .with_context(|| format!("smtp relay {}", cfg.server))?
        } else if cfg.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.server)
                .with_context(|| format!("smtp starttls relay {}", cfg.server))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.server)
        };

        let mut builder = builder
            .port(cfg.port)
            .timeout(Some(std::time::Duration::from_secs(10)));
        if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

fn build_message(mail: &OutgoingMail) -> anyhow::Result<Message> {
    let from: Mailbox = mail
        .sender
        .parse()
        .with_context(|| format!("invalid sender address {}", mail.sender))?;
    let mut builder = Message::builder().from(from).subject(mail.subject.clone());
    for rcpt in &mail.recipients {
        let to: Mailbox = rcpt
            .parse()
            .with_context(|| format!("invalid recipient address {rcpt}"))?;
        builder = builder.to(to);
    }
    builder
        .multipart(MultiPart::alternative_plain_html(
            mail.text_body.clone(),
            mail.html_body.clone(),
        ))
        .context("build email")
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        let message = build_message(mail)?;
        self.mailer.send(message).await.context("smtp send")?;
        Ok(())
    }
}
