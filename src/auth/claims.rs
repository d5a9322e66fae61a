use serde::{Deserialize, Serialize};

/// JWT payload carried by password reset links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub reset_password: i64, // user ID
    pub iat: i64,            // issued at (unix timestamp)
    pub exp: i64,            // expires at (unix timestamp)
}
