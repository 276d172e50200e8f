//! # phantom-shared
//!
//! Types shared by the Phantom store and server: resource identifiers, the
//! symmetric AEAD helpers, and the stateless access token service.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod token;
pub mod types;

pub use error::{CryptoError, IdError, TokenError};
pub use token::{Principal, TokenService};
pub use types::ObjectId;
