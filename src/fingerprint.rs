use std::fmt;

const UNKNOWN_AGENT: &str = "unknown";

/// The client fingerprint folded into every cookie tag.
///
/// It's derived from the `User-Agent` header of the incoming request, with ASCII letters
/// lower-cased. Non-ASCII bytes are kept as they are.
/// When the header is missing, the fingerprint is the literal string `unknown`.
///
/// A signed cookie is bound to the fingerprint it was issued for: replaying it
/// with a different declared user agent fails verification.
///
/// # Example
///
/// ```rust
/// use sigillo::Fingerprint;
///
/// let fingerprint = Fingerprint::from_user_agent(Some("Mozilla/5.0"));
/// assert_eq!(fingerprint.as_str(), "mozilla/5.0");
///
/// let fingerprint = Fingerprint::from_user_agent(None);
/// assert_eq!(fingerprint.as_str(), "unknown");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Builds a fingerprint out of the value of the `User-Agent` header, if any.
    pub fn from_user_agent(user_agent: Option<&str>) -> Fingerprint {
        match user_agent {
            Some(agent) => Fingerprint(agent.to_ascii_lowercase()),
            None => Fingerprint::unknown(),
        }
    }

    /// The fingerprint used for requests without a `User-Agent` header.
    pub fn unknown() -> Fingerprint {
        Fingerprint(UNKNOWN_AGENT.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Fingerprint::unknown()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
