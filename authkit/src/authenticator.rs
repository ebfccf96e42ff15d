use chrono::Duration;
use chrono::Utc;
use config::ConfigError;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use uuid::Uuid;

use crate::config::Config;
use crate::format::DecodeError;
use crate::format::EncodeError;
use crate::format::Format;
use crate::jwt::claims::expiration_after;
use crate::jwt::Claims;
use crate::jwt::JwtFormat;
use crate::pipeline::ResponsePipeline;

/// Per-request authenticator bookkeeping on top of a claims [`Format`].
///
/// The authenticator travels as a token in a response header. Host code runs
/// [`update`](Self::update) on every outgoing response, after the
/// application handler. [`renew`](Self::renew) and [`discard`](Self::discard)
/// are explicit actions taken by the handler; they touch the pipeline so the
/// later update leaves their result alone.
pub struct AuthenticatorService<F> {
    format: F,
    settings: AuthenticatorSettings,
}

/// Where and for how long authenticators are issued.
#[derive(Debug, Clone)]
pub struct AuthenticatorSettings {
    /// Header carrying the token on responses and requests
    pub header_name: String,
    /// Lifetime of a freshly created or renewed authenticator
    pub expiration: Duration,
    /// Issuer stamped into created claims
    pub issuer: Option<String>,
}

impl Default for AuthenticatorSettings {
    fn default() -> Self {
        Self {
            header_name: "X-Auth-Token".to_string(),
            expiration: Duration::hours(12),
            issuer: None,
        }
    }
}

/// Authenticator operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticatorError {
    #[error("Authenticator was already discarded or renewed on this response")]
    AlreadyTouched,

    #[error("Encode error: {0}")]
    EncodeError(#[from] EncodeError),

    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),
}

impl AuthenticatorService<JwtFormat> {
    /// Create a JWT-backed service from loaded configuration.
    ///
    /// # Errors
    /// * `ConfigError` - `expiration_hours` is not a representable duration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let hours = config.authenticator.expiration_hours;
        let expiration = Duration::try_hours(hours)
            .filter(|expiration| *expiration > Duration::zero())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "authenticator.expiration_hours out of range: {}",
                    hours
                ))
            })?;

        let settings = AuthenticatorSettings {
            header_name: config.authenticator.header_name.clone(),
            expiration,
            issuer: config.jwt.issuer.clone(),
        };

        Ok(Self::new(JwtFormat::from_config(&config.jwt), settings))
    }
}

impl<F: Format<Claims>> AuthenticatorService<F> {
    pub fn new(format: F, settings: AuthenticatorSettings) -> Self {
        Self { format, settings }
    }

    pub fn settings(&self) -> &AuthenticatorSettings {
        &self.settings
    }

    /// Create a new authenticator for `subject`.
    ///
    /// # Returns
    /// Claims with `sub`, `iat`, `exp`, a fresh `jti`, and the configured issuer
    ///
    /// # Errors
    /// * `InvalidClaim` - The configured expiration overflows a timestamp
    pub fn create(&self, subject: impl ToString) -> Result<Claims, EncodeError> {
        let claims = Claims::for_subject(subject, self.settings.expiration)?;

        Ok(match &self.settings.issuer {
            Some(issuer) => claims.with_issuer(issuer),
            None => claims,
        })
    }

    /// Serialize an authenticator into its token.
    ///
    /// # Errors
    /// * `EncodeError` - Claims could not be written
    pub fn init(&self, claims: &Claims) -> Result<String, EncodeError> {
        self.format.write(claims)
    }

    /// Put `token` on the response under the configured header.
    pub fn embed<P: ResponsePipeline>(&self, token: &str, pipeline: P) -> P {
        pipeline.with_headers([(self.settings.header_name.as_str(), token)])
    }

    /// Find the token on an incoming request.
    ///
    /// Looks at the configured header first, then `Authorization: Bearer`.
    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let configured = headers
            .get(self.settings.header_name.as_str())
            .and_then(|value| value.to_str().ok());
        if configured.is_some() {
            return configured;
        }

        headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    /// Read the authenticator carried by an incoming request.
    ///
    /// # Returns
    /// `None` when the request carries no token
    ///
    /// # Errors
    /// * `DecodeError` - A token is present but cannot be read
    pub fn retrieve(&self, headers: &HeaderMap) -> Result<Option<Claims>, DecodeError> {
        self.token_from_headers(headers)
            .map(|token| self.format.read(token))
            .transpose()
    }

    /// Re-embed the authenticator, unless the response was already touched.
    ///
    /// This is the automatic path run on every response. A touched pipeline
    /// is returned as-is so an explicit renew or discard survives.
    ///
    /// # Errors
    /// * `EncodeError` - Token generation failed
    pub fn update<P: ResponsePipeline>(
        &self,
        claims: &Claims,
        pipeline: P,
    ) -> Result<P, AuthenticatorError> {
        if pipeline.is_touched() {
            tracing::debug!(
                authenticator_id = ?claims.jti,
                "Authenticator already handled on this response, skipping update"
            );
            return Ok(pipeline);
        }

        let token = self.init(claims)?;
        Ok(self.embed(&token, pipeline))
    }

    /// Replace the authenticator with a fresh one and embed it.
    ///
    /// The new claims keep subject, issuer, audience and custom fields, with
    /// a new `jti`, `iat` and `exp`.
    ///
    /// # Returns
    /// The renewed claims and the touched pipeline
    ///
    /// # Errors
    /// * `AlreadyTouched` - The authenticator was already renewed or discarded
    /// * `EncodeError` - Token generation failed
    pub fn renew<P: ResponsePipeline>(
        &self,
        claims: &Claims,
        pipeline: P,
    ) -> Result<(Claims, P), AuthenticatorError> {
        if pipeline.is_touched() {
            return Err(AuthenticatorError::AlreadyTouched);
        }

        let now = Utc::now();
        let renewed = Claims {
            iat: Some(now.timestamp()),
            exp: Some(expiration_after(now, self.settings.expiration)?),
            jti: Some(Uuid::new_v4().to_string()),
            ..claims.clone()
        };
        let token = self.init(&renewed)?;

        tracing::info!(
            previous_id = ?claims.jti,
            authenticator_id = ?renewed.jti,
            "Authenticator renewed"
        );

        let pipeline = self.embed(&token, pipeline).touch();
        Ok((renewed, pipeline))
    }

    /// Drop the authenticator from this response.
    ///
    /// Tokens are stateless, so nothing is embedded; the pipeline is touched
    /// so the automatic update does not put the token back.
    ///
    /// # Errors
    /// * `AlreadyTouched` - The authenticator was already renewed or discarded
    pub fn discard<P: ResponsePipeline>(
        &self,
        claims: &Claims,
        pipeline: P,
    ) -> Result<P, AuthenticatorError> {
        if pipeline.is_touched() {
            return Err(AuthenticatorError::AlreadyTouched);
        }

        tracing::info!(authenticator_id = ?claims.jti, "Authenticator discarded");
        Ok(pipeline.touch())
    }
}
