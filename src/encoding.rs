use std::borrow::Cow;

use anyhow::Context;
use percent_encoding::{percent_decode_str, AsciiSet, CONTROLS};

/// https://url.spec.whatwg.org/#fragment-percent-encode-set
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// https://url.spec.whatwg.org/#path-percent-encode-set
const PATH: &AsciiSet = &FRAGMENT.add(b'#').add(b'?').add(b'{').add(b'}');

/// https://url.spec.whatwg.org/#userinfo-percent-encode-set
const USERINFO: &AsciiSet = &PATH
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|')
    .add(b'%');

/// https://www.rfc-editor.org/rfc/rfc6265#section-4.1.1 + '(', ')'
///
/// `~` is left alone: it's the delimiter of signed cookies.
const COOKIE: &AsciiSet = &USERINFO.add(b'(').add(b')').add(b',');

/// Percent-encode a cookie name or value with the proper encoding set.
pub(crate) fn encode(string: &str) -> impl std::fmt::Display + '_ {
    percent_encoding::percent_encode(string.as_bytes(), COOKIE)
}

/// Percent-decode a cookie name or value.
///
/// `what` describes the fragment for the error message, e.g. "the value of the `theme` cookie".
pub(crate) fn decode<'a>(raw: &'a str, what: &str) -> Result<Cow<'a, str>, anyhow::Error> {
    percent_decode_str(raw)
        .decode_utf8()
        .with_context(|| format!("Failed to percent-decode {what}: `{raw}`"))
}
