pub mod claims;
pub mod format;

pub use claims::Claims;
pub use format::JwtFormat;
