//! Immutable, framework-agnostic view over an outgoing response.
//!
//! A [`ResponsePipeline`] wraps exactly one native response value and exposes
//! its headers, cookies and session. Transformers consume the pipeline and
//! return a new one, so a value handed to a transformer can no longer be
//! observed by anyone else; adapters over `Clone` responses are `Clone` when a
//! caller needs to keep the previous state around.
//!
//! Every operation is total. Lookups of absent names return empty results and
//! removals of absent keys are no-ops.

use std::collections::BTreeMap;

pub mod http_response;
pub mod merge;
pub mod session;

pub use axum_extra::extract::cookie::Cookie;
pub use http_response::HttpResponsePipeline;
pub use session::Session;

/// Header name to its ordered values.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Structured access to an outgoing response, one implementation per host.
pub trait ResponsePipeline: Sized {
    /// Native response type of the host.
    type Response;

    /// Full current header set.
    fn headers(&self) -> Headers;

    /// Values for `name`, or an empty vector if absent.
    fn header(&self, name: &str) -> Vec<String> {
        self.headers().remove(name).unwrap_or_default()
    }

    /// Set headers, override-by-name and accumulate-within-call.
    ///
    /// Pairs are grouped by name keeping their call order. Each group fully
    /// replaces any values already present for that name, even when none of
    /// its values can be represented; names not mentioned are left untouched.
    /// An empty input returns the pipeline unchanged.
    ///
    /// `Set-Cookie` pairs are cookies, not headers: adapters merge them
    /// exactly like [`with_cookies`](Self::with_cookies).
    fn with_headers<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>;

    /// All cookies, in position order.
    fn cookies(&self) -> Vec<Cookie<'static>>;

    /// First cookie named `name`.
    fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies().into_iter().find(|c| c.name() == name)
    }

    /// Add or replace cookies.
    ///
    /// The last input cookie for a name wins. It takes the slot of an existing
    /// cookie with that name, or is appended. The result holds exactly one
    /// cookie per distinct name.
    fn with_cookies<I>(self, cookies: I) -> Self
    where
        I: IntoIterator<Item = Cookie<'static>>;

    fn session(&self) -> Session;

    /// Set session values, last value per key wins.
    fn with_session<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>;

    /// Remove session keys. Absent keys are ignored.
    fn without_session<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>;

    /// Hand the native response, with every edit applied, back to the host.
    fn unbox(self) -> Self::Response;

    /// Mark this response as already handled by an explicit authenticator
    /// operation. Content is unchanged; touching twice is a no-op.
    fn touch(self) -> Self;

    fn is_touched(&self) -> bool;
}
