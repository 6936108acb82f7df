use crate::encoding::encode;
use crate::expiration::MAX_DATETIME;
use crate::Expiration;
use std::borrow::Cow;
use std::fmt;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

/// How far in the past a removal cookie expires.
const REMOVAL_OFFSET: Duration = Duration::days(1);

/// A cookie set by a server in an HTTP response using the `Set-Cookie` header.
///
/// ## Building a `ResponseCookie`
///
/// ```rust
/// use sigillo::ResponseCookie;
///
/// let cookie = ResponseCookie::new("name", "value")
///     .set_domain("www.rust-lang.org")
///     .set_path("/")
///     .set_secure(true)
///     .set_http_only(true);
/// assert_eq!(
///     cookie.to_string(),
///     "name=value; HttpOnly; Secure; Path=/; Domain=www.rust-lang.org"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ResponseCookie<'c> {
    /// The cookie's name.
    pub(crate) name: Cow<'c, str>,
    /// The cookie's value.
    pub(crate) value: Cow<'c, str>,
    /// The cookie's expiration, if any.
    pub(crate) expires: Option<Expiration>,
    /// The cookie's domain, if any.
    pub(crate) domain: Option<Cow<'c, str>>,
    /// The cookie's path domain, if any.
    pub(crate) path: Option<Cow<'c, str>>,
    /// Whether this cookie was marked Secure.
    pub(crate) secure: Option<bool>,
    /// Whether this cookie was marked HttpOnly.
    pub(crate) http_only: Option<bool>,
}

impl<'c> ResponseCookie<'c> {
    /// Creates a new [`ResponseCookie`] with the given name and value.
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        ResponseCookie {
            name: name.into(),
            value: value.into(),
            expires: None,
            domain: None,
            path: None,
            secure: None,
            http_only: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    #[inline]
    pub fn value(&self) -> &str {
        self.value.as_ref()
    }

    /// Returns whether this cookie was marked `HttpOnly` or not. Returns
    /// `Some(true)` when the cookie was explicitly set as `HttpOnly`,
    /// `Some(false)` when `http_only` was manually set to `false`,
    /// and `None` otherwise.
    #[inline]
    pub fn http_only(&self) -> Option<bool> {
        self.http_only
    }

    /// Returns whether this cookie was marked `Secure` or not, with the same
    /// conventions as [`ResponseCookie::http_only()`].
    #[inline]
    pub fn secure(&self) -> Option<bool> {
        self.secure
    }

    /// Returns the `Path` of the cookie if one was specified.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the `Domain` of the cookie if one was specified.
    ///
    /// This does not consider whether the `Domain` is valid; validation is left
    /// to higher-level libraries, as needed. However, if the `Domain` starts
    /// with a leading `.`, the leading `.` is stripped.
    ///
    /// # Example
    ///
    /// ```
    /// use sigillo::ResponseCookie;
    ///
    /// let mut c = ResponseCookie::new("name", "value");
    /// assert_eq!(c.domain(), None);
    ///
    /// c = c.set_domain(".crates.io");
    /// assert_eq!(c.domain(), Some("crates.io"));
    ///
    /// // Note that `..crates.io` is not a valid domain.
    /// c = c.set_domain("..crates.io");
    /// assert_eq!(c.domain(), Some(".crates.io"));
    /// ```
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        match self.domain {
            Some(ref c) => {
                let domain = c.as_ref();
                domain.strip_prefix('.').or(Some(domain))
            }
            None => None,
        }
    }

    /// Returns the [`Expiration`] of the cookie if one was specified.
    #[inline]
    pub fn expires(&self) -> Option<Expiration> {
        self.expires
    }

    /// Returns the expiration date-time of the cookie if one was specified.
    ///
    /// It returns `None` if the cookie is a session cookie or if the expiration
    /// was not specified.
    #[inline]
    pub fn expires_datetime(&self) -> Option<OffsetDateTime> {
        self.expires.and_then(|e| e.datetime())
    }

    /// Sets the value of `self` to `value`.
    pub fn set_value<V: Into<Cow<'c, str>>>(mut self, value: V) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the value of `http_only` in `self` to `value`. If `value` is
    /// `None`, the field is unset.
    #[inline]
    pub fn set_http_only<T: Into<Option<bool>>>(mut self, value: T) -> Self {
        self.http_only = value.into();
        self
    }

    /// Sets the value of `secure` in `self` to `value`. If `value` is `None`,
    /// the field is unset.
    #[inline]
    pub fn set_secure<T: Into<Option<bool>>>(mut self, value: T) -> Self {
        self.secure = value.into();
        self
    }

    /// Sets the `path` of `self` to `path`.
    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `domain` of `self` to `domain`.
    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the expires field of `self` to `time`. If `time` is `None`, an
    /// expiration of [`Session`](Expiration::Session) is set.
    ///
    /// # Example
    ///
    /// ```
    /// use sigillo::{ResponseCookie, Expiration};
    /// use sigillo::time::{Duration, OffsetDateTime};
    ///
    /// let mut c = ResponseCookie::new("name", "value");
    /// assert_eq!(c.expires(), None);
    ///
    /// c = c.set_expires(OffsetDateTime::now_utc() + Duration::weeks(52));
    /// assert!(c.expires().is_some());
    ///
    /// c = c.set_expires(None);
    /// assert_eq!(c.expires(), Some(Expiration::Session));
    /// ```
    pub fn set_expires<T: Into<Expiration>>(mut self, time: T) -> Self {
        self.expires = Some(time.into().map(|time| std::cmp::min(time, MAX_DATETIME)));
        self
    }

    /// Makes `self` a "removal" cookie by clearing its value and
    /// setting an expiration date in the past.
    ///
    /// Path, domain and flags are preserved: the client only drops a cookie
    /// whose name, path and domain match.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sigillo::ResponseCookie;
    /// use sigillo::time::OffsetDateTime;
    ///
    /// let removal = ResponseCookie::new("theme", "dark").set_path("/").into_removal();
    /// assert_eq!(removal.value(), "");
    /// assert_eq!(removal.path(), Some("/"));
    /// assert!(removal.expires_datetime().unwrap() < OffsetDateTime::now_utc());
    /// ```
    pub fn into_removal(self) -> Self {
        self.set_value("")
            .set_expires(OffsetDateTime::now_utc() - REMOVAL_OFFSET)
    }

    /// Returns `true` if `self` and `other` target the same cookie on the client:
    /// same name, same path and same domain.
    ///
    /// Paths are case-sensitive, domains are not.
    pub fn same_target(&self, other: &ResponseCookie<'_>) -> bool {
        let same_domain = match (self.domain(), other.domain()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        self.name() == other.name() && self.path() == other.path() && same_domain
    }

    /// Formats `self` as a `Set-Cookie` header value.
    ///
    /// If `percent_encode` is `true`, the name and the value are percent-encoded.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sigillo::ResponseCookie;
    ///
    /// let cookie = ResponseCookie::new("greeting", "hello world").set_path("/");
    /// assert_eq!(cookie.header_value(true), "greeting=hello%20world; Path=/");
    /// assert_eq!(cookie.header_value(false), "greeting=hello world; Path=/");
    /// ```
    pub fn header_value(&self, percent_encode: bool) -> String {
        if percent_encode {
            format!(
                "{}={}{}",
                encode(self.name()),
                encode(self.value()),
                Parameters(self)
            )
        } else {
            self.to_string()
        }
    }

    fn fmt_parameters(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(true) = self.http_only() {
            write!(f, "; HttpOnly")?;
        }

        if let Some(true) = self.secure() {
            write!(f, "; Secure")?;
        }

        if let Some(path) = self.path() {
            write!(f, "; Path={}", path)?;
        }

        if let Some(domain) = self.domain() {
            write!(f, "; Domain={}", domain)?;
        }

        if let Some(time) = self.expires_datetime() {
            let time = time.to_offset(UtcOffset::UTC);

            // From http://tools.ietf.org/html/rfc2616#section-3.3.1.
            static FMT1: &[FormatItem<'_>] = format_description!("[weekday repr:short], [day] [month repr:short] [year padding:none] [hour]:[minute]:[second] GMT");
            write!(
                f,
                "; Expires={}",
                time.format(&FMT1).map_err(|_| fmt::Error)?
            )?;
        }

        Ok(())
    }
}

/// The attributes of a cookie, without its name and value.
struct Parameters<'a, 'c>(&'a ResponseCookie<'c>);

impl fmt::Display for Parameters<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt_parameters(f)
    }
}

impl<'c> fmt::Display for ResponseCookie<'c> {
    /// Formats the cookie `self` as a `Set-Cookie` header value, without percent-encoding.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value())?;
        self.fmt_parameters(f)
    }
}

impl<'a, 'b> PartialEq<ResponseCookie<'b>> for ResponseCookie<'a> {
    fn eq(&self, other: &ResponseCookie<'b>) -> bool {
        self.same_target(other)
            && self.value() == other.value()
            && self.http_only() == other.http_only()
            && self.secure() == other.secure()
            && self.expires() == other.expires()
    }
}
