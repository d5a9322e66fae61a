use std::sync::Arc;

use async_trait::async_trait;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        Mutex,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub text_body: String,
    pub html_body: String,
}

/// A single address or a list of them.
#[derive(Debug, Clone)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Recipients::One(addr) => vec![addr],
            Recipients::Many(addrs) => addrs,
        }
    }
}

impl From<&str> for Recipients {
    fn from(addr: &str) -> Self {
        Recipients::One(addr.to_string())
    }
}

impl From<String> for Recipients {
    fn from(addr: String) -> Self {
        Recipients::One(addr)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addrs: Vec<String>) -> Self {
        Recipients::Many(addrs)
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Fire-and-forget mail sender backed by a fixed pool of worker tasks.
///
/// The queue is bounded. When it is full the message is dropped and a warning is
/// logged; callers never learn whether delivery happened.
#[derive(Clone)]
pub struct MailDispatcher {
    queue: mpsc::Sender<OutgoingMail>,
    sender: String,
}

pub struct MailWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl MailDispatcher {
    /// Spawns `workers` delivery tasks on the current tokio runtime.
    pub fn start(
        transport: Arc<dyn MailTransport>,
        sender: impl Into<String>,
        workers: usize,
        capacity: usize,
    ) -> (Self, MailWorkers) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers.max(1))
            .map(|worker| tokio::spawn(run_worker(worker, rx.clone(), transport.clone())))
            .collect();
        (
            Self {
                queue: tx,
                sender: sender.into(),
            },
            MailWorkers { handles },
        )
    }

    pub fn send(
        &self,
        subject: &str,
        recipients: impl Into<Recipients>,
        text_body: String,
        html_body: String,
    ) {
        let mail = OutgoingMail {
            subject: subject.to_string(),
            sender: self.sender.clone(),
            recipients: recipients.into().into_vec(),
            text_body,
            html_body,
        };
        match self.queue.try_send(mail) {
            Ok(()) => debug!(subject, "mail queued"),
            Err(TrySendError::Full(mail)) => {
                warn!(subject = %mail.subject, recipients = ?mail.recipients, "mail queue full; message dropped")
            }
            Err(TrySendError::Closed(mail)) => {
                warn!(subject = %mail.subject, "mail workers stopped; message dropped")
            }
        }
    }
}

impl MailWorkers {
    /// Waits for queued mail to go out once every dispatcher handle is dropped.
    /// Workers still busy after `grace` are abandoned.
    pub async fn shutdown(self, grace: std::time::Duration) {
        if tokio::time::timeout(grace, join_workers(self.handles))
            .await
            .is_err()
        {
            warn!("mail workers did not drain in time; pending mail lost");
        } else {
            info!("mail workers stopped");
        }
    }
}

async fn join_workers(handles: Vec<JoinHandle<()>>) {
    for (worker, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            warn!(worker, error = %e, "mail worker terminated abnormally");
        }
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<Mutex<mpsc::Receiver<OutgoingMail>>>,
    transport: Arc<dyn MailTransport>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(mail) = next else { break };
        match transport.deliver(&mail).await {
            Ok(()) => info!(worker, subject = %mail.subject, recipients = ?mail.recipients, "mail sent"),
            Err(e) => warn!(worker, error = %e, subject = %mail.subject, "mail delivery failed"),
        }
    }
    debug!(worker, "mail worker exiting");
}
