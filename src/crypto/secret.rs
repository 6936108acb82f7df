use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

const GENERATED_SECRET_LENGTH: usize = 32;

/// The server-side secret folded into every cookie tag.
///
/// A `Secret` never prints its content: its [`Debug`] representation is redacted
/// and comparisons between secrets run in constant time.
///
/// An empty secret is a valid value for this type, since [`Config::default()`]
/// starts from one, but it can't be used to sign or verify cookies:
/// every attempt fails with a [`MissingSecretError`].
///
/// [`Config::default()`]: crate::Config
/// [`MissingSecretError`]: crate::errors::MissingSecretError
#[allow(clippy::derived_hash_with_manual_eq)]
#[derive(Clone, Default, Eq, Hash)]
pub struct Secret(String);

#[cfg(feature = "serde")]
mod deser {
    use crate::Secret;
    use serde::Deserializer;

    impl<'de> serde::Deserialize<'de> for Secret {
        fn deserialize<D>(deserializer: D) -> Result<Secret, D::Error>
        where
            D: Deserializer<'de>,
        {
            let secret = String::deserialize(deserializer)?;
            Ok(Secret::new(secret))
        }
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;

        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secret").field(&"***").finish()
    }
}

impl Secret {
    /// Wraps `secret` into a [`Secret`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use sigillo::Secret;
    ///
    /// let secret = Secret::new("s3cr3t");
    /// assert!(!secret.is_empty());
    /// assert_eq!(secret.expose(), "s3cr3t");
    /// ```
    pub fn new<S: Into<String>>(secret: S) -> Secret {
        Secret(secret.into())
    }

    /// Generates a secret from a secure, random source: 32 random bytes,
    /// encoded using URL-safe base64.
    ///
    /// # Panics
    ///
    /// Panics if randomness cannot be retrieved from the operating system. See
    /// [`Secret::try_generate()`] for a non-panicking version.
    pub fn generate() -> Secret {
        Self::try_generate().expect("failed to generate `Secret` from randomness")
    }

    /// Attempts to generate a secret from a secure, random source.
    /// If randomness cannot be retrieved from the underlying operating system, returns `None`.
    pub fn try_generate() -> Option<Secret> {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; GENERATED_SECRET_LENGTH];
        rng.try_fill_bytes(&mut bytes).ok()?;
        Some(Secret(BASE64_URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Returns `true` if no secret has been configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret(value.to_owned())
    }
}
