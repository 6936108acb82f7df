//! A crate to keep tamper-evident values in HTTP cookies, in a Rust server.
//!
//! # Overview
//!
//! `sigillo` lets you store a value on the client, in a cookie, without keeping any
//! server-side session state. Every value is **signed**: it travels together with a tag
//! computed from
//!
//! - a secret that never leaves the server,
//! - the client's declared user agent,
//! - the cookie name,
//! - the cookie value.
//!
//! A cookie whose tag doesn't match (because the value was edited, the cookie was renamed,
//! or it's being replayed by a different user agent) is rejected and deleted.
//!
//! On the wire, a signed cookie looks like `<tag>~<value>`. The tag has a fixed length,
//! [`TAG_LEN`], so the value itself is free to contain `~`.
//!
//! It has support for:
//!
//! - Verifying, setting and deleting signed cookies, via [`CookieStore`]
//! - Parsing the cookies attached to incoming requests, via [`RequestCookies`]
//! - Building the `Set-Cookie` headers for outgoing responses, via [`ResponseCookies`],
//!   or your own [`CookieTransport`]
//!
//! # Non-goals
//!
//! Values are authenticated, **not** encrypted: don't store anything the client isn't
//! allowed to read.
//! `sigillo` doesn't handle multiple cookies with the same name, nor does it provide
//! session storage.
//!
//! # Quickstart
//!
//! ```rust
//! use sigillo::{Config, CookieStore, Fingerprint, RequestCookies, ResponseCookies};
//!
//! // Build the configuration once, when the server starts.
//! let config = Config::new("s3cr3t");
//! let user_agent = Some("Mozilla/5.0");
//!
//! // First request: store a value on the client.
//! let mut store = CookieStore::new(
//!     &config,
//!     Fingerprint::from_user_agent(user_agent),
//!     RequestCookies::new(),
//!     ResponseCookies::new(),
//! );
//! store.set("theme", "dark").unwrap();
//! let (_, response) = store.into_parts();
//! let set_cookie: Vec<String> = response.header_values(config.percent_encode).collect();
//! // `theme=<tag>~dark; Path=/`
//! assert!(set_cookie[0].ends_with("~dark; Path=/"));
//!
//! // Second request: the client sends the cookie back.
//! let cookie_header = set_cookie[0].split(';').next().unwrap();
//! let request = RequestCookies::parse_header(cookie_header, config.percent_encode).unwrap();
//! let mut store = CookieStore::new(
//!     &config,
//!     Fingerprint::from_user_agent(user_agent),
//!     request,
//!     ResponseCookies::new(),
//! );
//! assert_eq!(store.get_or("theme", "light").unwrap(), "dark");
//! ```
//!
//! ## Credits
//!
//! The cookie modelling in `sigillo` is heavily inspired by the
//! [`cookie` crate](https://crates.io/crates/cookie)
//! [Copyright (c) 2017 Sergio Benitez, Copyright (c) 2014 Alex Crichton].

pub mod config;
mod crypto;
mod encoding;
mod expiration;
mod fingerprint;
mod request_cookies;
mod response_cookie;
mod response_cookies;
mod store;
mod transport;

pub use config::{Config, SigningAlgorithm};
pub use crypto::{Secret, Signer, Tag, Verification, DELIMITER, TAG_LEN};
pub use expiration::Expiration;
pub use fingerprint::Fingerprint;
pub use request_cookies::RequestCookies;
pub use response_cookie::ResponseCookie;
pub use response_cookies::ResponseCookies;
pub use store::CookieStore;
pub use time;
pub use transport::CookieTransport;

/// Errors that can occur when using `sigillo`.
pub mod errors {
    pub use crate::crypto::MissingSecretError;
    pub use crate::request_cookies::{DecodingError, EmptyNameError, MissingPairError, ParseError};
    pub use crate::store::CookieError;
    pub use crate::transport::TransportError;
}
