use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::config::SigningAlgorithm;
use crate::{Config, Fingerprint, Secret};

/// The length, in characters, of every tag produced by a [`Signer`].
///
/// Tags are the hex encoding of a SHA-256 output (32 bytes), whatever the algorithm.
pub const TAG_LEN: usize = 64;

/// The separator between the tag and the value in a signed cookie.
pub const DELIMITER: char = '~';

/// Computes and checks the tags of signed cookies.
///
/// A signed cookie's value on the wire is `<tag>~<value>`.
/// The tag is a deterministic function of the client [`Fingerprint`], the cookie name,
/// the cookie value and the configured [`Secret`]. It always has the same length,
/// [`TAG_LEN`], and that's what allows [`Signer::unsign`] to find the delimiter
/// by position: the value is free to contain `~` characters.
///
/// # Example
///
/// ```rust
/// use sigillo::{Config, Fingerprint, Signer, Verification, TAG_LEN};
///
/// let config = Config::new("s3cr3t");
/// let signer = Signer::new(&config, Fingerprint::from_user_agent(Some("Mozilla/5.0")));
///
/// let wire = signer.sign("theme", "dark").unwrap();
/// assert_eq!(wire.len(), TAG_LEN + "~dark".len());
/// assert_eq!(signer.unsign("theme", &wire).unwrap(), Verification::Authentic("dark"));
/// ```
#[derive(Debug, Clone)]
pub struct Signer<'a> {
    secret: &'a Secret,
    algorithm: SigningAlgorithm,
    fingerprint: Fingerprint,
}

/// The outcome of [`Signer::unsign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification<'w> {
    /// The tag matches: the cookie value can be trusted.
    Authentic(&'w str),
    /// There is no delimiter right after a [`TAG_LEN`]-long prefix.
    Malformed,
    /// The tag doesn't match the value.
    Forged,
}

impl<'w> Verification<'w> {
    /// Returns the authenticated value, if any.
    pub fn authentic(self) -> Option<&'w str> {
        match self {
            Verification::Authentic(value) => Some(value),
            Verification::Malformed | Verification::Forged => None,
        }
    }
}

impl<'a> Signer<'a> {
    /// Creates a signer for requests coming from the client identified by `fingerprint`.
    pub fn new(config: &'a Config, fingerprint: Fingerprint) -> Self {
        Signer {
            secret: &config.secret,
            algorithm: config.algorithm,
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Computes the tag for a cookie named `name` holding `value`.
    ///
    /// It fails if the configured secret is empty.
    pub fn tag(&self, name: &str, value: &str) -> Result<Tag, MissingSecretError> {
        if self.secret.is_empty() {
            tracing::error!(
                cookie.name = name,
                "Cannot compute a cookie tag: the signing secret is not set"
            );
            return Err(MissingSecretError);
        }

        let fingerprint = self.fingerprint.as_str().as_bytes();
        let tag = match self.algorithm {
            SigningAlgorithm::Digest => {
                let mut hasher = Sha256::new();
                hasher.update(fingerprint);
                hasher.update(name.as_bytes());
                hasher.update(value.as_bytes());
                hasher.update(self.secret.expose().as_bytes());
                hex::encode(hasher.finalize())
            }
            SigningAlgorithm::Hmac => {
                let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose().as_bytes())
                    .expect("HMAC accepts keys of any length");
                mac.update(fingerprint);
                mac.update(name.as_bytes());
                mac.update(value.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
        };
        debug_assert_eq!(tag.len(), TAG_LEN);
        Ok(Tag(tag))
    }

    /// Checks, in constant time, whether `candidate` is the tag for `name` and `value`.
    pub fn verify(
        &self,
        name: &str,
        value: &str,
        candidate: &str,
    ) -> Result<bool, MissingSecretError> {
        let expected = self.tag(name, value)?;
        Ok(expected.matches(candidate))
    }

    /// Builds the wire value of a signed cookie: `<tag>~<value>`.
    pub fn sign(&self, name: &str, value: &str) -> Result<String, MissingSecretError> {
        let tag = self.tag(name, value)?;
        let mut wire = String::with_capacity(TAG_LEN + 1 + value.len());
        wire.push_str(tag.as_str());
        wire.push(DELIMITER);
        wire.push_str(value);
        Ok(wire)
    }

    /// Splits the wire value of a signed cookie and checks its tag.
    ///
    /// The delimiter must sit exactly at offset [`TAG_LEN`]: no attempt is made
    /// to look for it elsewhere.
    pub fn unsign<'w>(
        &self,
        name: &str,
        wire: &'w str,
    ) -> Result<Verification<'w>, MissingSecretError> {
        if self.secret.is_empty() {
            return Err(MissingSecretError);
        }
        // A `~` at `TAG_LEN` is ASCII, so `TAG_LEN` and `TAG_LEN + 1` are char boundaries.
        if wire.as_bytes().get(TAG_LEN) != Some(&(DELIMITER as u8)) {
            return Ok(Verification::Malformed);
        }
        let (tag, rest) = wire.split_at(TAG_LEN);
        let value = &rest[DELIMITER.len_utf8()..];

        if self.verify(name, value, tag)? {
            Ok(Verification::Authentic(value))
        } else {
            Ok(Verification::Forged)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("signing secret not set")]
/// The error returned when a cookie has to be signed or verified, but the
/// configured secret is empty.
///
/// It's a deployment mistake, not something a request can recover from:
/// surface it to the operator.
pub struct MissingSecretError;

/// The tag of a signed cookie, hex encoded.
///
/// Comparisons run in constant time.
#[derive(Clone, Eq)]
pub struct Tag(String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares `self` with `candidate` in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.0).finish()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
