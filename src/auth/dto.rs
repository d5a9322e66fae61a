use serde::Serialize;

use super::{controller::Page, forms::FieldErrors, repo_types::User, session::Flash};

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Body of a rendered form page.
#[derive(Debug, Serialize)]
pub struct PageBody {
    pub view: &'static str,
    pub title: &'static str,
    pub errors: FieldErrors,
    pub flashes: Vec<Flash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl PageBody {
    pub fn new(page: Page, flashes: Vec<Flash>) -> Self {
        let token = match &page.view {
            super::controller::View::ResetPassword { token } => Some(token.clone()),
            _ => None,
        };
        Self {
            view: page.view.name(),
            title: page.view.title(),
            errors: page.errors,
            flashes,
            token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexBody {
    pub user: Option<PublicUser>,
    pub flashes: Vec<Flash>,
}
