use std::collections::HashMap;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::ser::Error as _;
use serde::ser::SerializeMap;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use uuid::Uuid;

use crate::format::EncodeError;

/// Registered claim names; custom fields may not reuse them.
pub const REGISTERED_CLAIMS: [&str; 7] = ["sub", "exp", "iat", "nbf", "iss", "aud", "jti"];

/// Decoded token contents.
///
/// Registered RFC 7519 claims plus custom fields via the flattened `extra`
/// map. Every registered claim is optional; which ones a reader insists on is
/// decided by the format's validation settings.
///
/// Serialization fails when `extra` holds a registered claim name, so a
/// written token always reads back to the same claims.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user/entity identifier)
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    pub iat: Option<i64>,

    /// Not before (Unix timestamp)
    pub nbf: Option<i64>,

    /// Issuer
    pub iss: Option<String>,

    /// Audience
    pub aud: Option<String>,

    /// JWT ID, doubles as the authenticator id
    pub jti: Option<String>,

    /// Custom fields, flattened into the token payload
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Serialize for Claims {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(key) = self
            .extra
            .keys()
            .find(|key| REGISTERED_CLAIMS.contains(&key.as_str()))
        {
            return Err(S::Error::custom(format!(
                "custom field '{}' collides with a registered claim",
                key
            )));
        }

        let mut map = serializer.serialize_map(None)?;
        if let Some(sub) = &self.sub {
            map.serialize_entry("sub", sub)?;
        }
        if let Some(exp) = &self.exp {
            map.serialize_entry("exp", exp)?;
        }
        if let Some(iat) = &self.iat {
            map.serialize_entry("iat", iat)?;
        }
        if let Some(nbf) = &self.nbf {
            map.serialize_entry("nbf", nbf)?;
        }
        if let Some(iss) = &self.iss {
            map.serialize_entry("iss", iss)?;
        }
        if let Some(aud) = &self.aud {
            map.serialize_entry("aud", aud)?;
        }
        if let Some(jti) = &self.jti {
            map.serialize_entry("jti", jti)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Unix timestamp `ttl` after `now`.
///
/// # Errors
/// * `InvalidClaim` - The expiration does not fit in a timestamp
pub fn expiration_after(now: DateTime<Utc>, ttl: Duration) -> Result<i64, EncodeError> {
    now.checked_add_signed(ttl)
        .map(|expiration| expiration.timestamp())
        .ok_or_else(|| EncodeError::InvalidClaim(format!("exp out of range for ttl {}", ttl)))
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims for a freshly issued authenticator.
    ///
    /// Sets `sub`, `iat`, `exp = iat + ttl` and a random `jti`.
    ///
    /// # Errors
    /// * `InvalidClaim` - `iat + ttl` does not fit in a timestamp
    pub fn for_subject(subject: impl ToString, ttl: Duration) -> Result<Self, EncodeError> {
        let now = Utc::now();

        Ok(Self {
            sub: Some(subject.to_string()),
            exp: Some(expiration_after(now, ttl)?),
            iat: Some(now.timestamp()),
            jti: Some(Uuid::new_v4().to_string()),
            ..Self::default()
        })
    }

    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set not before (Unix timestamp).
    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    pub fn with_issuer(mut self, iss: impl ToString) -> Self {
        self.iss = Some(iss.to_string());
        self
    }

    pub fn with_audience(mut self, aud: impl ToString) -> Self {
        self.aud = Some(aud.to_string());
        self
    }

    pub fn with_id(mut self, jti: impl ToString) -> Self {
        self.jti = Some(jti.to_string());
        self
    }

    /// Add a custom field.
    ///
    /// Registered claim names and values that fail to serialize are ignored;
    /// use the dedicated builders for registered claims.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        let key = key.to_string();
        if REGISTERED_CLAIMS.contains(&key.as_str()) {
            tracing::warn!(claim = %key, "Ignoring custom field named like a registered claim");
            return self;
        }
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key, json_value);
        }
        self
    }

    /// Check if the token is expired at `current_timestamp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(false, |exp| exp < current_timestamp)
    }
}
