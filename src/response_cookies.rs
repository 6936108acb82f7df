use crate::errors::TransportError;
use crate::{CookieTransport, ResponseCookie};

/// The cookies to be sent back to the client via `Set-Cookie` headers.
///
/// A cookie replaces any previously inserted cookie with the same name, path and domain:
/// the client would only keep the last one anyway.
/// Cookies with the same name but a different path or domain are kept side by side.
///
/// Once [`ResponseCookies::close()`] has been called, the headers are considered sent
/// and every further write fails with [`TransportError::HeadersSent`].
///
/// # Example
///
/// ```rust
/// use sigillo::{ResponseCookie, ResponseCookies};
///
/// let mut cookies = ResponseCookies::new();
/// cookies.insert(ResponseCookie::new("name", "a value")).unwrap();
/// cookies.insert(ResponseCookie::new("name", "a value").set_path("/")).unwrap();
/// // Replaces the first cookie: same name, same (lack of) path and domain.
/// cookies.insert(ResponseCookie::new("name", "another value")).unwrap();
///
/// let header_values: Vec<_> = cookies.header_values(true).collect();
/// assert_eq!(header_values, vec![
///     "name=another%20value".to_string(),
///     "name=a%20value; Path=/".to_string(),
/// ]);
///
/// cookies.close();
/// assert!(cookies.insert(ResponseCookie::new("late", "value")).is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct ResponseCookies {
    /// In insertion order.
    cookies: Vec<ResponseCookie<'static>>,
    headers_sent: bool,
}

impl ResponseCookies {
    /// Creates a new, empty [`ResponseCookies`].
    pub fn new() -> ResponseCookies {
        Default::default()
    }

    /// Queues `cookie` to be sent to the client.
    pub fn insert<C>(&mut self, cookie: C) -> Result<(), TransportError>
    where
        C: Into<ResponseCookie<'static>>,
    {
        let cookie = cookie.into();
        if self.headers_sent {
            return Err(TransportError::HeadersSent {
                name: cookie.name().to_owned(),
            });
        }
        match self.cookies.iter_mut().find(|c| c.same_target(&cookie)) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
        Ok(())
    }

    /// Returns the first queued cookie named `name`, if any.
    pub fn get(&self, name: &str) -> Option<&ResponseCookie<'static>> {
        self.cookies.iter().find(|c| c.name() == name)
    }

    /// Iterates over the queued cookies, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ResponseCookie<'static>> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Marks the response headers as sent: no more cookies can be added.
    pub fn close(&mut self) {
        self.headers_sent = true;
    }

    /// Returns `true` if [`ResponseCookies::close()`] has been called.
    pub fn is_closed(&self) -> bool {
        self.headers_sent
    }

    /// Returns the `Set-Cookie` header values for the queued cookies.
    ///
    /// If `percent_encode` is `true`, cookie names and values are percent-encoded.
    pub fn header_values(&self, percent_encode: bool) -> impl Iterator<Item = String> + '_ {
        self.cookies
            .iter()
            .map(move |c| c.header_value(percent_encode))
    }
}

impl CookieTransport for ResponseCookies {
    fn set_cookie(&mut self, cookie: ResponseCookie<'static>) -> Result<(), TransportError> {
        self.insert(cookie)
    }
}

impl<'a> IntoIterator for &'a ResponseCookies {
    type Item = &'a ResponseCookie<'static>;
    type IntoIter = std::slice::Iter<'a, ResponseCookie<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.iter()
    }
}
