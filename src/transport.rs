use crate::ResponseCookie;

/// The response side of the cookie transport: where [`CookieStore`] writes
/// the cookies it wants the client to store or remove.
///
/// [`ResponseCookies`] is the implementation provided by this crate.
/// Implement this trait to write cookies straight into the response of your
/// HTTP framework of choice.
///
/// # Example
///
/// ```rust
/// use sigillo::{CookieTransport, ResponseCookie};
/// use sigillo::errors::TransportError;
///
/// /// Collects raw `Set-Cookie` header values.
/// #[derive(Default)]
/// struct Headers(Vec<String>);
///
/// impl CookieTransport for Headers {
///     fn set_cookie(&mut self, cookie: ResponseCookie<'static>) -> Result<(), TransportError> {
///         self.0.push(cookie.header_value(true));
///         Ok(())
///     }
/// }
///
/// let mut headers = Headers::default();
/// headers.set_cookie(ResponseCookie::new("theme", "dark")).unwrap();
/// assert_eq!(headers.0, vec!["theme=dark".to_string()]);
/// ```
///
/// [`CookieStore`]: crate::CookieStore
/// [`ResponseCookies`]: crate::ResponseCookies
pub trait CookieTransport {
    /// Queues `cookie` to be sent to the client.
    ///
    /// Implementations must not retry: a rejected write is reported to the caller.
    fn set_cookie(&mut self, cookie: ResponseCookie<'static>) -> Result<(), TransportError>;
}

impl<T: CookieTransport + ?Sized> CookieTransport for &mut T {
    fn set_cookie(&mut self, cookie: ResponseCookie<'static>) -> Result<(), TransportError> {
        (**self).set_cookie(cookie)
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned when a [`CookieTransport`] refuses to write a cookie.
pub enum TransportError {
    /// The response headers have already been sent: it's too late to set cookies.
    #[error("Cannot set the `{name}` cookie: the response headers have already been sent")]
    HeadersSent { name: String },
    /// The transport rejected the cookie for another reason.
    #[error("The transport rejected the `{name}` cookie")]
    Rejected {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TransportError {
    /// Builds a [`TransportError::Rejected`] for the cookie named `name`.
    pub fn rejected<N, E>(name: N, source: E) -> Self
    where
        N: Into<String>,
        E: Into<anyhow::Error>,
    {
        TransportError::Rejected {
            name: name.into(),
            source: source.into(),
        }
    }

    /// The name of the cookie that couldn't be written.
    pub fn cookie_name(&self) -> &str {
        match self {
            TransportError::HeadersSent { name } | TransportError::Rejected { name, .. } => name,
        }
    }
}
