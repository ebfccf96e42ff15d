use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::Error as JwtLibError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::JwtConfig;
use crate::format::DecodeError;
use crate::format::EncodeError;
use crate::format::Reads;
use crate::format::Writes;

/// JWT [`Format`](crate::format::Format) backed by `jsonwebtoken`.
///
/// Generic over the claims type: any `T: Serialize + DeserializeOwned` can be
/// written and read back. Uses HS256 (HMAC with SHA-256) by default.
///
/// Reading always checks the signature and, when present, `exp` and `nbf`.
/// Issuer and audience are only checked when configured, and no registered
/// claim is required unless listed via [`JwtFormat::with_required_claims`].
#[derive(Clone)]
pub struct JwtFormat {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    max_token_length: Option<usize>,
}

impl JwtFormat {
    /// Create a new JWT format with a shared secret.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self::from_keys(
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
            Algorithm::HS256,
        )
    }

    /// Create a JWT format from explicit keys, e.g. an RSA key pair.
    pub fn from_keys(
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            encoding_key,
            decoding_key,
            algorithm,
            validation: default_validation(algorithm),
            max_token_length: None,
        }
    }

    /// Build a format from loaded configuration.
    pub fn from_config(config: &JwtConfig) -> Self {
        let mut format = Self::new(config.secret.as_bytes())
            .with_required_claims(config.required_claims.as_slice())
            .with_leeway(config.leeway_seconds);

        if let Some(issuer) = &config.issuer {
            format = format.with_issuer(issuer);
        }
        if let Some(audience) = &config.audience {
            format = format.with_audience(audience);
        }
        if let Some(max) = config.max_token_length {
            format = format.with_max_token_length(max);
        }

        format
    }

    /// Use another HMAC variant (HS384, HS512) with the same secret.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self.validation.algorithms = vec![algorithm];
        self
    }

    /// Only accept tokens issued by `issuer`.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Only accept tokens addressed to `audience`.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Registered claims (`exp`, `sub`, ...) a token must carry to be read.
    pub fn with_required_claims<S: ToString>(mut self, claims: &[S]) -> Self {
        self.validation.set_required_spec_claims(claims);
        self
    }

    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    /// Reject writes producing tokens longer than `max` bytes.
    ///
    /// Cookie and header transports cap value sizes; this surfaces the limit
    /// as an `EncodeError` at write time.
    pub fn with_max_token_length(mut self, max: usize) -> Self {
        self.max_token_length = Some(max);
        self
    }

    /// Decode a token without validation (for inspection only).
    ///
    /// # Errors
    /// * `Malformed` - Token format is invalid
    ///
    /// # Security Warning
    /// This does NOT validate the token signature or any time-based claim.
    /// Never trust claims from this method for authorization decisions.
    pub fn read_unverified<T: DeserializeOwned>(&self, token: &str) -> Result<T, DecodeError> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let token_data = decode::<T>(token, &self.decoding_key, &validation)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        Ok(token_data.claims)
    }
}

impl<T: Serialize> Writes<T> for JwtFormat {
    fn write(&self, value: &T) -> Result<String, EncodeError> {
        let header = Header::new(self.algorithm);

        let token = encode(&header, value, &self.encoding_key).map_err(encode_error)?;

        match self.max_token_length {
            Some(max) if token.len() > max => Err(EncodeError::TooLarge {
                max,
                actual: token.len(),
            }),
            _ => Ok(token),
        }
    }
}

impl<T: DeserializeOwned> Reads<T> for JwtFormat {
    fn read(&self, token: &str) -> Result<T, DecodeError> {
        let token_data = decode::<T>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT decoding failed");
            decode_error(e)
        })?;

        Ok(token_data.claims)
    }
}

fn default_validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    // Allow tokens without 'exp' claim for flexibility
    validation.required_spec_claims.clear();
    validation.validate_nbf = true;
    // 'aud' is only checked once an audience is configured
    validation.validate_aud = false;
    validation
}

fn encode_error(error: JwtLibError) -> EncodeError {
    match error.kind() {
        ErrorKind::Json(e) => EncodeError::Serialization(e.to_string()),
        _ => EncodeError::Signing(error.to_string()),
    }
}

fn decode_error(error: JwtLibError) -> DecodeError {
    match error.kind() {
        ErrorKind::ExpiredSignature => DecodeError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => DecodeError::InvalidSignature,
        ErrorKind::MissingRequiredClaim(claim) => DecodeError::MissingClaim(claim.clone()),
        ErrorKind::ImmatureSignature => DecodeError::InvalidClaim("nbf".to_string()),
        ErrorKind::InvalidIssuer => DecodeError::InvalidClaim("iss".to_string()),
        ErrorKind::InvalidAudience => DecodeError::InvalidClaim("aud".to_string()),
        ErrorKind::InvalidSubject => DecodeError::InvalidClaim("sub".to_string()),
        _ => DecodeError::Malformed(error.to_string()),
    }
}
