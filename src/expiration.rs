use time::macros::datetime;
use time::{Duration, OffsetDateTime};

/// RFC 6265 requires dates not to exceed 9999 years.
pub(crate) const MAX_DATETIME: OffsetDateTime = datetime!(9999-12-31 23:59:59.999_999 UTC);

/// A cookie's expiration: either a date-time or session.
///
/// An `Expiration` is constructible with `Expiration::from()` via any of:
///
///   * `None` -> `Expiration::Session`
///   * `Some(OffsetDateTime)` -> `Expiration::DateTime`
///   * `OffsetDateTime` -> `Expiration::DateTime`
///
/// ```rust
/// use sigillo::Expiration;
/// use sigillo::time::OffsetDateTime;
///
/// let expires = Expiration::from(None);
/// assert_eq!(expires, Expiration::Session);
///
/// let now = OffsetDateTime::now_utc();
/// let expires = Expiration::from(now);
/// assert_eq!(expires, Expiration::DateTime(now));
///
/// let expires = Expiration::from(Some(now));
/// assert_eq!(expires, Expiration::DateTime(now));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiration {
    /// Expiration for a "permanent" cookie at a specific date-time.
    DateTime(OffsetDateTime),
    /// Expiration for a "session" cookie. Browsers define the notion of a
    /// "session" and will automatically expire session cookies when they deem
    /// the "session" to be over. This is typically, but need not be, when the
    /// browser is closed.
    Session,
}

impl Expiration {
    /// Resolves a lifetime expressed in seconds.
    ///
    /// `0` is a session cookie; any other value is an absolute date-time, `seconds`
    /// from now. Negative values land in the past.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sigillo::Expiration;
    /// use sigillo::time::OffsetDateTime;
    ///
    /// assert!(Expiration::after_seconds(0).is_session());
    ///
    /// let expires = Expiration::after_seconds(3600).datetime().unwrap();
    /// assert!(expires > OffsetDateTime::now_utc());
    /// ```
    pub fn after_seconds(seconds: i64) -> Expiration {
        if seconds == 0 {
            return Expiration::Session;
        }
        let now = OffsetDateTime::now_utc();
        let at = now
            .checked_add(Duration::seconds(seconds))
            .unwrap_or(if seconds > 0 {
                MAX_DATETIME
            } else {
                OffsetDateTime::UNIX_EPOCH
            });
        Expiration::DateTime(at)
    }

    /// Returns `true` if `self` is an `Expiration::Session`.
    pub fn is_session(&self) -> bool {
        match self {
            Expiration::DateTime(_) => false,
            Expiration::Session => true,
        }
    }

    /// Returns the inner [`OffsetDateTime`] value if `self` is a `DateTime`.
    pub fn datetime(self) -> Option<OffsetDateTime> {
        match self {
            Expiration::Session => None,
            Expiration::DateTime(v) => Some(v),
        }
    }

    /// Applies `f` to the inner `OffsetDateTime` if `self` is a `DateTime` and
    /// returns the mapped `Expiration`.
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(OffsetDateTime) -> OffsetDateTime,
    {
        match self {
            Expiration::Session => Expiration::Session,
            Expiration::DateTime(v) => Expiration::DateTime(f(v)),
        }
    }
}

impl<T: Into<Option<OffsetDateTime>>> From<T> for Expiration {
    fn from(option: T) -> Self {
        match option.into() {
            Some(value) => Expiration::DateTime(value),
            None => Expiration::Session,
        }
    }
}
