/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Symmetric key size in bytes (for XChaCha20-Poly1305)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Minimum length of the configured token secret, in bytes
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Resource identifier size in bytes (rendered as 24 hex chars)
pub const OBJECT_ID_SIZE: usize = 12;

/// Version prefix carried by every access token
pub const TOKEN_PREFIX: &str = "v1.local.";

/// Key derivation context (BLAKE3) for the access token key
pub const KDF_CONTEXT_TOKEN_KEY: &str = "phantom-access-token-v1";

/// Largest page a movie listing may request
pub const MAX_MOVIE_PAGE_SIZE: u32 = 50;

/// Largest page a comment listing may request
pub const MAX_COMMENT_PAGE_SIZE: u32 = 20;

/// Length of the trailing genre search window, in months
pub const GENRE_WINDOW_MONTHS: u32 = 12;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default access token lifetime in seconds (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_SECS: u64 = 15 * 60;
