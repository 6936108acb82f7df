use crate::errors::{MissingSecretError, TransportError};
use crate::{
    Config, CookieTransport, Expiration, Fingerprint, RequestCookies, ResponseCookie, Signer,
    Verification,
};

/// Reads and writes signed cookies for a single request.
///
/// A `CookieStore` ties together:
///
/// - the process-wide [`Config`], borrowed;
/// - the [`Fingerprint`] of the client that sent the request;
/// - the [`RequestCookies`] parsed out of the request's `Cookie` header;
/// - a [`CookieTransport`] to write `Set-Cookie` headers into the response.
///
/// # Reading
///
/// [`CookieStore::get()`] returns the value of a cookie only if its tag is valid for the
/// current client. A cookie that fails verification is deleted on the spot and treated
/// as absent.
///
/// # Writing
///
/// [`CookieStore::set()`] signs the value and queues the cookie on the transport.
/// [`CookieStore::delete()`] queues a removal cookie.
///
/// # Example
///
/// ```rust
/// use sigillo::{Config, CookieStore, Fingerprint, RequestCookies, ResponseCookies};
///
/// let config = Config::new("s3cr3t");
/// let fingerprint = Fingerprint::from_user_agent(Some("Mozilla/5.0"));
/// let mut store = CookieStore::new(&config, fingerprint, RequestCookies::new(), ResponseCookies::new());
///
/// assert_eq!(store.get_or("theme", "light").unwrap(), "light");
/// store.set("theme", "dark").unwrap();
/// assert_eq!(store.get_or("theme", "light").unwrap(), "dark");
///
/// store.delete("theme").unwrap();
/// assert_eq!(store.get("theme").unwrap(), None);
/// ```
#[derive(Debug)]
pub struct CookieStore<'a, T> {
    config: &'a Config,
    signer: Signer<'a>,
    request: RequestCookies<'a>,
    transport: T,
}

impl<'a, T> CookieStore<'a, T>
where
    T: CookieTransport,
{
    pub fn new(
        config: &'a Config,
        fingerprint: Fingerprint,
        request: RequestCookies<'a>,
        transport: T,
    ) -> Self {
        CookieStore {
            config,
            signer: Signer::new(config, fingerprint),
            request,
            transport,
        }
    }

    /// Returns the authenticated value of the cookie named `name`.
    ///
    /// It returns `None` if the cookie is absent or if it fails verification.
    /// In the latter case the cookie is deleted, see [`CookieStore::delete()`].
    /// A failure to write the removal cookie is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// It fails with [`MissingSecretError`] if no secret has been configured,
    /// whether or not the cookie is present.
    pub fn get(&mut self, name: &str) -> Result<Option<String>, MissingSecretError> {
        if let Err(e) = self.config.validate() {
            tracing::error!(
                cookie.name = name,
                "Cannot read a signed cookie: the signing secret is not set"
            );
            return Err(e);
        }

        let rejection = match self.request.get(name) {
            None => return Ok(None),
            Some(wire) => match self.signer.unsign(name, wire)? {
                Verification::Authentic(value) => return Ok(Some(value.to_owned())),
                Verification::Malformed => "malformed",
                Verification::Forged => "invalid tag",
            },
        };

        tracing::warn!(
            cookie.name = name,
            reason = rejection,
            "Rejected a signed cookie, deleting it"
        );
        if let Err(e) = self.delete(name) {
            tracing::warn!(
                cookie.name = name,
                error.msg = %e,
                "Failed to delete a rejected cookie"
            );
        }
        Ok(None)
    }

    /// Returns the authenticated value of the cookie named `name`, or `default`
    /// if there is none.
    ///
    /// See [`CookieStore::get()`] for details.
    pub fn get_or<D>(&mut self, name: &str, default: D) -> Result<String, MissingSecretError>
    where
        D: Into<String>,
    {
        Ok(self.get(name)?.unwrap_or_else(|| default.into()))
    }

    /// Signs `value` and sends it to the client as the cookie named `name`.
    ///
    /// The cookie lifetime is [`Config::default_expiration_seconds`].
    /// Use [`CookieStore::set_with_expiration()`] to override it.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), CookieError> {
        self.set_with_expiration(name, value, self.config.default_expiration_seconds)
    }

    /// Signs `value` and sends it to the client as the cookie named `name`,
    /// expiring `expiration_seconds` from now.
    ///
    /// `0` sets a session cookie.
    pub fn set_with_expiration(
        &mut self,
        name: &str,
        value: &str,
        expiration_seconds: i64,
    ) -> Result<(), CookieError> {
        let wire = self.signer.sign(name, value)?;
        let cookie = self
            .base_cookie(name, wire.clone())
            .set_expires(Expiration::after_seconds(expiration_seconds));

        self.transport.set_cookie(cookie)?;
        self.request.insert(name.to_owned(), wire);
        tracing::debug!(
            cookie.name = name,
            cookie.expiration_seconds = expiration_seconds,
            "Set a signed cookie"
        );
        Ok(())
    }

    /// Removes the cookie named `name` from the current request and asks the client
    /// to delete it, via a cookie with an empty value and an expiration in the past.
    ///
    /// The removal cookie is sent even if the request didn't carry `name`.
    pub fn delete(&mut self, name: &str) -> Result<(), TransportError> {
        self.request.remove(name);
        let cookie = self.base_cookie(name, String::new()).into_removal();
        self.transport.set_cookie(cookie)?;
        tracing::debug!(cookie.name = name, "Deleted a cookie");
        Ok(())
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn signer(&self) -> &Signer<'a> {
        &self.signer
    }

    /// The cookies of the current request, as seen by this store.
    pub fn request_cookies(&self) -> &RequestCookies<'a> {
        &self.request
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consumes the store, returning the request cookies and the transport.
    pub fn into_parts(self) -> (RequestCookies<'a>, T) {
        (self.request, self.transport)
    }

    /// A cookie carrying the configured path, domain and flags.
    fn base_cookie(&self, name: &str, value: String) -> ResponseCookie<'static> {
        let mut cookie = ResponseCookie::new(name.to_owned(), value)
            .set_path(self.config.path.clone())
            .set_secure(self.config.secure)
            .set_http_only(self.config.http_only);
        if let Some(domain) = &self.config.domain {
            cookie = cookie.set_domain(domain.clone());
        }
        cookie
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`CookieStore::set()`].
pub enum CookieError {
    #[error(transparent)]
    MissingSecret(#[from] MissingSecretError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;
    use std::sync::{Arc, Mutex};

    use googletest::prelude::{assert_that, contains_substring, ends_with, starts_with};
    use time::OffsetDateTime;

    use crate::errors::{CookieError, TransportError};
    use crate::{
        Config, CookieStore, CookieTransport, Fingerprint, RequestCookies, ResponseCookie,
        ResponseCookies, SigningAlgorithm, TAG_LEN,
    };

    fn fingerprint(agent: &str) -> Fingerprint {
        Fingerprint::from_user_agent(Some(agent))
    }

    fn new_store<'a>(
        config: &'a Config,
        agent: &str,
        request: RequestCookies<'a>,
    ) -> CookieStore<'a, ResponseCookies> {
        CookieStore::new(config, fingerprint(agent), request, ResponseCookies::new())
    }

    /// Issues `name=value` and returns the wire value the client would store.
    fn issue(config: &Config, agent: &str, name: &str, value: &str) -> String {
        let mut store = new_store(config, agent, RequestCookies::new());
        store.set(name, value).unwrap();
        store.transport().get(name).unwrap().value().to_owned()
    }

    fn request_with(name: &str, wire: &str) -> RequestCookies<'static> {
        let mut request = RequestCookies::new();
        request.insert(name.to_owned(), wire.to_owned());
        request
    }

    /// A transport that refuses every cookie, counting the attempts.
    #[derive(Debug, Default)]
    struct Refusing {
        attempts: usize,
    }

    impl CookieTransport for Refusing {
        fn set_cookie(&mut self, cookie: ResponseCookie<'static>) -> Result<(), TransportError> {
            self.attempts += 1;
            Err(TransportError::rejected(
                cookie.name(),
                anyhow::anyhow!("the response is streaming"),
            ))
        }
    }

    /// Collects formatted log lines.
    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Logs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Logs {
        /// Runs `f` with a subscriber writing into `self`.
        fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
            let logs = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || logs.clone())
                .with_ansi(false)
                .finish();
            tracing::subscriber::with_default(subscriber, f)
        }

        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[track_caller]
    fn assert_removal(response: &ResponseCookies, name: &str) {
        let removal = response
            .get(name)
            .unwrap_or_else(|| panic!("No removal cookie for `{name}`"));
        assert_eq!(removal.value(), "");
        assert!(removal.expires_datetime().unwrap() < OffsetDateTime::now_utc());
    }

    #[test]
    fn scenario() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "mozilla/5.0", "theme", "dark");

        assert_eq!(wire.len(), TAG_LEN + "~dark".len());
        assert_that!(wire, ends_with("~dark"));
        assert!(wire[..TAG_LEN].chars().all(|c| c.is_ascii_hexdigit()));

        let mut store = new_store(&config, "mozilla/5.0", request_with("theme", &wire));
        assert_eq!(store.get_or("theme", "light").unwrap(), "dark");
        assert!(store.transport().is_empty());

        let flipped = match wire.as_bytes()[0] {
            b'0' => format!("1{}", &wire[1..]),
            _ => format!("0{}", &wire[1..]),
        };
        let mut store = new_store(&config, "mozilla/5.0", request_with("theme", &flipped));
        assert_eq!(store.get_or("theme", "light").unwrap(), "light");
        assert!(!store.request_cookies().contains("theme"));
        assert_removal(store.transport(), "theme");
    }

    #[test]
    fn header_roundtrip() {
        let config = Config::new("s3cr3t");
        let value = "a b; c=d~e%";

        let mut store = new_store(&config, "Firefox", RequestCookies::new());
        store.set("prefs", value).unwrap();
        let (_, response) = store.into_parts();
        let set_cookie: Vec<String> = response.header_values(config.percent_encode).collect();
        assert_that!(set_cookie[0], ends_with("~a%20b%3B%20c%3Dd~e%25; Path=/"));

        // The client echoes `name=value` back, without the attributes.
        let pair = set_cookie[0].split("; ").next().unwrap();
        let header = format!("other=1; {pair}");
        let request = RequestCookies::parse_header(&header, config.percent_encode).unwrap();

        let mut store = new_store(&config, "Firefox", request);
        assert_eq!(store.get("prefs").unwrap().as_deref(), Some(value));
        assert!(store.transport().is_empty());
    }

    #[test]
    fn roundtrip() {
        for algorithm in [SigningAlgorithm::Digest, SigningAlgorithm::Hmac] {
            let mut config = Config::new("s3cr3t");
            config.algorithm = algorithm;
            for (name, value) in [
                ("theme", "dark"),
                ("empty", ""),
                ("tilde", "~a~b~"),
                ("json", r#"{"id":42,"tags":["a","b"]}"#),
                ("unicode", "ünïcödé ✓"),
            ] {
                let wire = issue(&config, "Firefox", name, value);
                let mut store = new_store(&config, "Firefox", request_with(name, &wire));
                assert_eq!(
                    store.get(name).unwrap().as_deref(),
                    Some(value),
                    "{algorithm:?}"
                );
            }
        }
    }

    #[test]
    fn any_single_character_flip_is_detected() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "mozilla/5.0", "theme", "dark");

        for (i, c) in wire.char_indices() {
            let replacement = if c == 'a' { 'b' } else { 'a' };
            let mut tampered = wire.clone();
            tampered.replace_range(i..i + c.len_utf8(), &replacement.to_string());

            let mut store = new_store(&config, "mozilla/5.0", request_with("theme", &tampered));
            assert_eq!(store.get("theme").unwrap(), None, "flip at {i}: {tampered}");
            assert!(!store.request_cookies().contains("theme"));
            assert_removal(store.transport(), "theme");
        }
    }

    #[test]
    fn cookies_are_bound_to_the_fingerprint() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "Firefox", "theme", "dark");

        let mut store = new_store(&config, "Chrome", request_with("theme", &wire));
        assert_eq!(store.get_or("theme", "light").unwrap(), "light");
        assert_removal(store.transport(), "theme");

        // A missing user agent is a fingerprint like any other.
        let mut store = CookieStore::new(
            &config,
            Fingerprint::from_user_agent(None),
            request_with("theme", &wire),
            ResponseCookies::new(),
        );
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn cookies_are_bound_to_their_name() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "Firefox", "theme", "dark");

        let mut store = new_store(&config, "Firefox", request_with("layout", &wire));
        assert_eq!(store.get("layout").unwrap(), None);
    }

    #[test]
    fn cookies_are_bound_to_the_secret() {
        let wire = issue(&Config::new("s3cr3t"), "Firefox", "theme", "dark");

        let rotated = Config::new("n3w-s3cr3t");
        let mut store = new_store(&rotated, "Firefox", request_with("theme", &wire));
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "Firefox", "theme", "dark");
        let cases = [
            "dark".to_string(),
            "".to_string(),
            wire[..TAG_LEN].to_string(),
            // A `~` elsewhere doesn't count.
            format!("{}~dark", &wire[..TAG_LEN - 2]),
            format!("x{wire}"),
        ];

        for case in cases {
            let mut store = new_store(&config, "Firefox", request_with("theme", &case));
            assert_eq!(store.get("theme").unwrap(), None, "{case:?}");
            assert_removal(store.transport(), "theme");
        }
    }

    #[test]
    fn absent_cookie_returns_the_default_without_writing() {
        let config = Config::new("s3cr3t");
        let mut store = new_store(&config, "Firefox", RequestCookies::new());

        assert_eq!(store.get("theme").unwrap(), None);
        assert_eq!(store.get_or("theme", "light").unwrap(), "light");
        assert!(store.transport().is_empty());
    }

    #[test]
    fn missing_secret_fails_without_writing() {
        let config = Config::default();
        let mut store = new_store(&config, "Firefox", request_with("theme", "whatever"));

        let err = store.set("theme", "dark").unwrap_err();
        assert!(matches!(err, CookieError::MissingSecret(_)));
        assert_eq!(err.to_string(), "signing secret not set");

        assert!(store.get("theme").is_err());
        assert!(store.get("absent").is_err());
        assert!(store.get_or("theme", "light").is_err());

        assert!(store.transport().is_empty());
        // The cookie is not treated as tampered.
        assert!(store.request_cookies().contains("theme"));
    }

    #[test]
    fn set_uses_the_configured_attributes() {
        let mut config = Config::new("s3cr3t");
        config.path = "/app".to_owned();
        config.domain = Some("example.com".to_owned());
        config.secure = true;
        config.http_only = true;

        let mut store = new_store(&config, "Firefox", RequestCookies::new());
        store.set("theme", "dark").unwrap();

        let cookie = store.transport().get("theme").unwrap();
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.expires_datetime(), None);

        let header = store.transport().header_values(true).next().unwrap();
        assert_that!(header, starts_with("theme="));
        assert_that!(
            header,
            ends_with("~dark; HttpOnly; Secure; Path=/app; Domain=example.com")
        );

        store.delete("theme").unwrap();
        let removal = store.transport().get("theme").unwrap();
        assert_eq!(removal.path(), Some("/app"));
        assert_eq!(removal.domain(), Some("example.com"));
        assert_eq!(removal.secure(), Some(true));
        assert_eq!(removal.http_only(), Some(true));
        // The removal replaced the cookie set earlier.
        assert_eq!(store.transport().len(), 1);
    }

    #[test]
    fn expiration() {
        let mut config = Config::new("s3cr3t");
        config.default_expiration_seconds = 3600;
        let mut store = new_store(&config, "Firefox", RequestCookies::new());

        let before = OffsetDateTime::now_utc();
        store.set("a", "1").unwrap();
        let expires = store.transport().get("a").unwrap().expires_datetime().unwrap();
        assert!(expires >= before + time::Duration::seconds(3599));
        assert!(expires <= OffsetDateTime::now_utc() + time::Duration::seconds(3601));

        // Overrides
        store.set_with_expiration("b", "2", 0).unwrap();
        assert!(store.transport().get("b").unwrap().expires().unwrap().is_session());

        store.set_with_expiration("c", "3", 60).unwrap();
        let expires = store.transport().get("c").unwrap().expires_datetime().unwrap();
        assert!(expires <= OffsetDateTime::now_utc() + time::Duration::seconds(61));
    }

    #[test]
    fn set_then_get_within_the_same_request() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "Firefox", "theme", "dark");
        let mut store = new_store(&config, "Firefox", request_with("theme", &wire));

        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));

        store.delete("theme").unwrap();
        assert_eq!(store.get("theme").unwrap(), None);
    }

    #[test]
    fn delete_is_idempotent() {
        let config = Config::new("s3cr3t");
        let mut store = new_store(&config, "Firefox", RequestCookies::new());

        store.delete("theme").unwrap();
        store.delete("theme").unwrap();
        assert_removal(store.transport(), "theme");
        assert_eq!(store.transport().len(), 1);
    }

    #[test]
    fn transport_failures_are_reported() {
        let config = Config::new("s3cr3t");
        let mut response = ResponseCookies::new();
        response.close();
        let mut store = CookieStore::new(
            &config,
            fingerprint("Firefox"),
            RequestCookies::new(),
            &mut response,
        );

        let err = store.set("theme", "dark").unwrap_err();
        assert!(matches!(
            err,
            CookieError::Transport(TransportError::HeadersSent { .. })
        ));
        // A rejected write leaves the request untouched.
        assert!(!store.request_cookies().contains("theme"));

        let err = store.delete("theme").unwrap_err();
        assert_eq!(err.cookie_name(), "theme");
    }

    #[test]
    fn rejected_writes_are_reported() {
        let config = Config::new("s3cr3t");
        let wire = issue(&config, "Firefox", "theme", "dark");
        let mut store = CookieStore::new(
            &config,
            fingerprint("Firefox"),
            request_with("theme", &wire),
            Refusing::default(),
        );

        let err = match store.set("theme", "light").unwrap_err() {
            CookieError::Transport(e) => e,
            e => panic!("Expected a transport error, got {e:?}"),
        };
        assert!(matches!(err, TransportError::Rejected { .. }));
        assert_eq!(err.cookie_name(), "theme");
        assert_eq!(err.to_string(), "The transport rejected the `theme` cookie");
        assert_eq!(
            err.source().unwrap().to_string(),
            "the response is streaming"
        );
        // The request still holds the value sent by the client.
        assert_eq!(store.request_cookies().get("theme"), Some(wire.as_str()));
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn rejected_self_healing_returns_the_default() {
        let config = Config::new("s3cr3t");
        let mut store = CookieStore::new(
            &config,
            fingerprint("Firefox"),
            request_with("theme", "forged"),
            Refusing::default(),
        );

        assert_eq!(store.get_or("theme", "light").unwrap(), "light");
        assert_eq!(store.transport().attempts, 1);
        assert!(!store.request_cookies().contains("theme"));
    }

    #[test]
    fn missing_secret_is_logged_on_read() {
        let config = Config::default();
        let logs = Logs::default();
        let result = logs.capture(|| {
            let mut store = new_store(&config, "Firefox", RequestCookies::new());
            store.get("theme")
        });

        assert!(result.is_err());
        let contents = logs.contents();
        assert_that!(contents, contains_substring("ERROR"));
        assert_that!(contents, contains_substring("the signing secret is not set"));
        assert_that!(contents, contains_substring("theme"));
    }

    #[test]
    fn failed_self_healing_is_not_an_error() {
        let config = Config::new("s3cr3t");
        let mut response = ResponseCookies::new();
        response.close();
        let mut store = CookieStore::new(
            &config,
            fingerprint("Firefox"),
            request_with("theme", "forged"),
            &mut response,
        );

        assert_eq!(store.get_or("theme", "light").unwrap(), "light");
        assert!(!store.request_cookies().contains("theme"));
    }
}
