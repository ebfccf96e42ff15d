//! Authentication toolkit primitives
//!
//! Provides the response-side building blocks an authentication layer needs:
//! - An immutable response pipeline for reading and rewriting headers,
//!   cookies and session data on an outgoing response
//! - Fallible, pluggable token formats (Reads/Writes) with a JWT implementation
//! - Authenticator bookkeeping coordinated through the pipeline's touched marker
//!
//! # Examples
//!
//! ## Response Pipeline
//! ```
//! use authkit::pipeline::{Cookie, HttpResponsePipeline, ResponsePipeline};
//!
//! let pipeline = HttpResponsePipeline::new(http::Response::new(()))
//!     .with_headers([("Cache-Control", "no-store")])
//!     .with_cookies([Cookie::new("theme", "dark")])
//!     .with_session([("user", "alice")]);
//!
//! assert_eq!(pipeline.header("cache-control"), vec!["no-store"]);
//! assert_eq!(pipeline.session().get("user"), Some("alice"));
//!
//! let response = pipeline.unbox();
//! assert_eq!(response.headers()["set-cookie"], "theme=dark");
//! ```
//!
//! ## JWT Format
//! ```
//! use authkit::{Claims, JwtFormat, Reads, Writes};
//!
//! let format = JwtFormat::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = Claims::new().with_subject("user123");
//! let token = format.write(&claims).unwrap();
//! let decoded: Claims = format.read(&token).unwrap();
//! assert_eq!(decoded, claims);
//! ```
//!
//! ## Authenticator Flow
//! ```
//! use authkit::pipeline::{HttpResponsePipeline, ResponsePipeline};
//! use authkit::{AuthenticatorService, AuthenticatorSettings, JwtFormat};
//!
//! let service = AuthenticatorService::new(
//!     JwtFormat::new(b"secret_key_at_least_32_bytes_long!"),
//!     AuthenticatorSettings::default(),
//! );
//! let claims = service.create("user123").unwrap();
//!
//! // Handler logs the user out
//! let pipeline = HttpResponsePipeline::new(http::Response::new(()));
//! let pipeline = service.discard(&claims, pipeline).unwrap();
//!
//! // Automatic update runs last and leaves the discarded response alone
//! let pipeline = service.update(&claims, pipeline).unwrap();
//! assert!(pipeline.header("X-Auth-Token").is_empty());
//! ```

pub mod authenticator;
pub mod config;
pub mod format;
pub mod jwt;
pub mod pipeline;

// Re-export commonly used items
pub use authenticator::AuthenticatorError;
pub use authenticator::AuthenticatorService;
pub use authenticator::AuthenticatorSettings;
pub use format::DecodeError;
pub use format::EncodeError;
pub use format::Format;
pub use format::FormatError;
pub use format::FormatPair;
pub use format::Reads;
pub use format::Writes;
pub use jwt::Claims;
pub use jwt::JwtFormat;
pub use pipeline::HttpResponsePipeline;
pub use pipeline::ResponsePipeline;
pub use pipeline::Session;
