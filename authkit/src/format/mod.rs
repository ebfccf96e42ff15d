//! Fallible, bidirectional conversion between a token string and a value.
//!
//! [`Reads`] and [`Writes`] are independent; anything implementing both is a
//! [`Format`]. A format must round-trip values (`read(write(v)) == Ok(v)`) but
//! is free to produce different text for the same value.

pub mod errors;
pub mod pair;

pub use errors::DecodeError;
pub use errors::EncodeError;
pub use errors::FormatError;
pub use pair::FormatPair;

/// Reading direction: token string to value.
pub trait Reads<T> {
    /// Decode `token`.
    ///
    /// # Errors
    /// * `DecodeError` - Token is malformed, fails validation, or lacks a
    ///   required claim
    fn read(&self, token: &str) -> Result<T, DecodeError>;
}

/// Writing direction: value to token string.
pub trait Writes<T> {
    /// Encode `value`.
    ///
    /// # Errors
    /// * `EncodeError` - Value cannot be serialized or signed
    fn write(&self, value: &T) -> Result<String, EncodeError>;
}

/// Both directions for the same type.
pub trait Format<T>: Reads<T> + Writes<T> {}

impl<T, F> Format<T> for F where F: Reads<T> + Writes<T> {}

impl<T, F> Reads<T> for F
where
    F: Fn(&str) -> Result<T, DecodeError>,
{
    fn read(&self, token: &str) -> Result<T, DecodeError> {
        self(token)
    }
}

impl<T, F> Writes<T> for F
where
    F: Fn(&T) -> Result<String, EncodeError>,
{
    fn write(&self, value: &T) -> Result<String, EncodeError> {
        self(value)
    }
}
