mod dispatcher;
mod smtp;
pub mod templates;

pub use dispatcher::{MailDispatcher, MailTransport, MailWorkers, OutgoingMail, Recipients};
pub use smtp::SmtpMailTransport;
