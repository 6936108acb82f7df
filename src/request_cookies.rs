use std::borrow::Cow;
use std::collections::HashMap;

use crate::encoding::decode;

#[derive(Default, Debug, Clone)]
/// The cookies attached to an HTTP request using the `Cookie` header.
///
/// It holds a single value per cookie name. When the same name shows up more than
/// once, the first occurrence is kept.
///
/// A [`CookieStore`] owns the [`RequestCookies`] of the request it serves
/// and keeps them up to date: a cookie deleted during the request is gone from the map,
/// a cookie set during the request can be read back.
///
/// [`CookieStore`]: crate::CookieStore
pub struct RequestCookies<'cookie> {
    cookies: HashMap<Cow<'cookie, str>, Cow<'cookie, str>>,
}

impl<'cookie> RequestCookies<'cookie> {
    /// Creates a new, empty [`RequestCookies`] map.
    pub fn new() -> RequestCookies<'cookie> {
        Default::default()
    }

    /// Inserts a cookie into `self`, replacing the existing value for `name`, if any.
    ///
    /// # Return value
    ///
    /// Returns `true` if [`RequestCookies`] contained a cookie with the same name.
    /// `false` otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sigillo::RequestCookies;
    ///
    /// let mut cookies = RequestCookies::new();
    /// assert!(!cookies.insert("name", "value1"));
    /// assert!(cookies.insert("name", "value2"));
    /// assert_eq!(cookies.get("name"), Some("value2"));
    /// ```
    pub fn insert<N, V>(&mut self, name: N, value: V) -> bool
    where
        N: Into<Cow<'cookie, str>>,
        V: Into<Cow<'cookie, str>>,
    {
        self.cookies.insert(name.into(), value.into()).is_some()
    }

    /// Get the value of a cookie by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|v| v.as_ref())
    }

    /// Removes a cookie from `self`, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Cow<'cookie, str>> {
        self.cookies.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Iterates over `(name, value)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(n, v)| (n.as_ref(), v.as_ref()))
    }

    /// Parse a `Cookie` header value into a [`RequestCookies`] map.
    ///
    /// If `percent_decode` is `true`, cookie names and values are percent-decoded.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sigillo::RequestCookies;
    ///
    /// let cookies = RequestCookies::parse_header(
    ///     "name=first%20value; name2=val; name=another%20value",
    ///     true,
    /// ).unwrap();
    /// assert_eq!(cookies.get("name"), Some("first value"));
    /// assert_eq!(cookies.get("name2"), Some("val"));
    /// ```
    pub fn parse_header(
        header: &'cookie str,
        percent_decode: bool,
    ) -> Result<RequestCookies<'cookie>, ParseError> {
        let mut cookies = RequestCookies::new();
        cookies.extend_from_header(header, percent_decode)?;
        Ok(cookies)
    }

    /// Parse a `Cookie` header value and add its cookies to the existing [`RequestCookies`] map.
    ///
    /// Names already present in the map are left untouched.
    pub fn extend_from_header(
        &mut self,
        header: &'cookie str,
        percent_decode: bool,
    ) -> Result<(), ParseError> {
        for cookie in header.split(';') {
            if cookie.chars().all(char::is_whitespace) {
                continue;
            }

            let (name, value) = match cookie.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => {
                    let e = MissingPairError {
                        fragment: cookie.to_string(),
                    };
                    return Err(ParseError::MissingPair(e));
                }
            };

            if name.is_empty() {
                let e = EmptyNameError {
                    value: value.to_string(),
                };
                return Err(ParseError::EmptyName(e));
            }

            let (name, value): (Cow<'cookie, str>, Cow<'cookie, str>) = if percent_decode {
                let decoded_name = decode(name, "a cookie name").map_err(|e| DecodingError {
                    raw_value: name.to_string(),
                    source: e,
                })?;
                let decoded_value =
                    decode(value, &format!("the value of the `{decoded_name}` cookie")).map_err(
                        |e| DecodingError {
                            raw_value: value.to_string(),
                            source: e,
                        },
                    )?;
                (decoded_name, decoded_value)
            } else {
                (name.into(), value.into())
            };

            self.cookies.entry(name).or_insert(value);
        }
        Ok(())
    }
}

#[derive(Debug)]
#[non_exhaustive]
/// The error returned by [`RequestCookies::parse_header()`].
pub enum ParseError {
    MissingPair(MissingPairError),
    EmptyName(EmptyNameError),
    Decoding(DecodingError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse cookies out of a header value")
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::MissingPair(e) => Some(e),
            ParseError::EmptyName(e) => Some(e),
            ParseError::Decoding(e) => Some(e),
        }
    }
}

impl From<DecodingError> for ParseError {
    fn from(e: DecodingError) -> Self {
        ParseError::Decoding(e)
    }
}

#[derive(Debug)]
/// An error that occurs when parsing a fragment of a `Cookie` header value
/// that doesn't contain a name-value separator (`=`).
pub struct MissingPairError {
    fragment: String,
}

impl std::fmt::Display for MissingPairError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expected a name-value pair, but no `=` was found in `{}`",
            self.fragment
        )
    }
}

impl std::error::Error for MissingPairError {}

#[derive(Debug)]
/// An error that occurs when parsing a fragment of a `Cookie` header value
/// that contains an empty name (e.g. `=value`).
pub struct EmptyNameError {
    value: String,
}

impl std::fmt::Display for EmptyNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The name of a cookie cannot be empty, but found an empty name with `{}` as value",
            self.value
        )
    }
}

impl std::error::Error for EmptyNameError {}

#[derive(Debug, thiserror::Error)]
#[error("{source}")]
/// An error that occurred while percent-decoding a cookie name or value.
pub struct DecodingError {
    raw_value: String,
    #[source]
    source: anyhow::Error,
}

impl DecodingError {
    /// The fragment that couldn't be decoded.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }
}
