use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::ResetClaims;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired at {0}")]
    Expired(i64),
    #[error(transparent)]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies password reset tokens with the process-wide secret.
#[derive(Clone)]
pub struct ResetTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl ResetTokenCodec {
    pub const DEFAULT_TTL: Duration = Duration::seconds(600);

    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn encode(&self, user_id: i64) -> anyhow::Result<String> {
        self.encode_with_ttl(user_id, self.ttl)
    }

    pub fn encode_with_ttl(&self, user_id: i64, ttl: Duration) -> anyhow::Result<String> {
        self.encode_at(user_id, ttl, OffsetDateTime::now_utc())
    }

    fn encode_at(&self, user_id: i64, ttl: Duration, now: OffsetDateTime) -> anyhow::Result<String> {
        let claims = ResetClaims {
            reset_password: user_id,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, exp = claims.exp, "reset token signed");
        Ok(token)
    }

    /// Returns the subject of a valid, unexpired token. Every failure is logged and
    /// collapsed into `None`.
    pub fn decode(&self, token: &str) -> Option<i64> {
        match self.decode_at(token, OffsetDateTime::now_utc()) {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                warn!(error = %e, "error during reset token decoding");
                None
            }
        }
    }

    fn decode_at(&self, token: &str, now: OffsetDateTime) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against `now`, without leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<ResetClaims>(token, &self.decoding, &validation)?;
        if data.claims.exp <= now.unix_timestamp() {
            return Err(TokenError::Expired(data.claims.exp));
        }
        Ok(data.claims.reset_password)
    }
}
