//! Configuration for a [`CookieStore`].
//!
//! Check out the [`Config`] struct for more information.
//!
//! [`CookieStore`]: crate::CookieStore
use crate::errors::MissingSecretError;
use crate::Secret;

/// `Config` specifies how signed cookies are issued and verified.
///
/// It's meant to be built once, when the server starts, and then shared by reference
/// with the [`CookieStore`] created for each incoming request.
///
/// ```rust
/// use sigillo::{Config, Secret};
///
/// let mut config = Config::new(
///     // You'll load the secret from *somewhere* in production, e.g.
///     // from a file, an environment variable or a secret management service.
///     Secret::generate(),
/// );
/// config.http_only = true;
/// config.secure = true;
/// config.default_expiration_seconds = 60 * 60 * 24 * 7;
/// assert!(config.validate().is_ok());
/// ```
///
/// [`CookieStore`]: crate::CookieStore
#[derive(Debug, Clone)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// The secret used to compute cookie tags.
    ///
    /// # Requirements
    ///
    /// It must be non-empty: reading or writing a signed cookie with an empty
    /// secret fails with a [`MissingSecretError`].
    pub secret: Secret,
    /// The lifetime of issued cookies, in seconds, when the caller doesn't specify one.
    ///
    /// `0` issues session cookies, which the client discards when its session ends.
    ///
    /// By default, this field is `0`.
    pub default_expiration_seconds: i64,
    /// The `Path` attribute of issued cookies.
    ///
    /// By default, this field is `/`.
    pub path: String,
    /// The `Domain` attribute of issued cookies, if any.
    pub domain: Option<String>,
    /// If `true`, issued cookies are marked `Secure` and the client will
    /// only send them over encrypted connections.
    pub secure: bool,
    /// If `true`, issued cookies are marked `HttpOnly` and are hidden
    /// from client-side scripts.
    pub http_only: bool,
    /// How cookie tags are computed.
    ///
    /// By default, this field is [`SigningAlgorithm::Digest`].
    pub algorithm: SigningAlgorithm,
    /// If `true`, cookie names and values are automatically:
    ///
    /// - percent-decoded, when parsing request cookies out of the `Cookie` header.
    /// - percent-encoded, when building the `Set-Cookie` header from response cookies.
    ///
    /// By default, this field is `true`.
    pub percent_encode: bool,
}

impl Config {
    /// Creates a [`Config`] with the given secret and default values for every other field.
    pub fn new<S: Into<Secret>>(secret: S) -> Config {
        Config {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Checks that the configuration can be used to sign cookies.
    ///
    /// Call it at startup to surface a missing secret before the first request
    /// is served.
    pub fn validate(&self) -> Result<(), MissingSecretError> {
        if self.secret.is_empty() {
            return Err(MissingSecretError);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            secret: Secret::default(),
            default_expiration_seconds: 0,
            path: "/".to_owned(),
            domain: None,
            secure: false,
            http_only: false,
            algorithm: SigningAlgorithm::default(),
            percent_encode: true,
        }
    }
}

/// The ways a cookie tag can be computed.
///
/// Both algorithms are built on SHA-256 and produce tags of exactly
/// [`TAG_LEN`] characters, regardless of the cookie value.
///
/// [`TAG_LEN`]: crate::TAG_LEN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SigningAlgorithm {
    /// SHA-256 over the client fingerprint, the cookie name, the cookie value
    /// and the secret, concatenated in this order.
    #[default]
    Digest,
    /// HMAC-SHA256 keyed with the secret, over the client fingerprint,
    /// the cookie name and the cookie value, concatenated in this order.
    Hmac,
}
