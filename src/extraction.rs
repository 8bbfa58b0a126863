//! # extraction
//!
//! Scraping of the few vendor values the login flow depends on.
//!
//! Everything that pattern-matches connectMLS markup or redirect text lives
//! here, so a change on the vendor side only touches this module:
//! - the `_csrf` hidden input of the login form
//! - the `&code=` exchange code handed out after a successful credential check
//! - the tenant API host, picked out of the session cookie domains
//!
//! ## Usage
//!
//! ```rust
//! use connectmls_api::extraction::find_csrf_token;
//! let html = r#"<form><input type="hidden" name="_csrf" value="abc-123" /></form>"#;
//! assert_eq!(find_csrf_token(html).unwrap(), "abc-123");
//! ```
use crate::errors::ConnectMlsError;
use crate::utils::{make_selector, safe_static_regex, safe_static_selector};
use crate::{define_regex, define_selector};
use regex::Regex;
use scraper::{Html, selector::Selector};
use std::sync::LazyLock;

define_selector!(
    CSRF_SELECTOR,
    CSRF_SELECTOR_TEXT,
    r#"input[name="_csrf"]"#
);
define_regex!(EXCHANGE_CODE_REGEX, EXCHANGE_CODE_REGEX_TEXT, r"&code=([^']+)");

/// Get the CSRF token embedded in the login form
///
/// # Arguments
/// * `html` - the login page html
///
/// # Returns
/// * the value of the first non-empty `_csrf` input, or a protocol error when the
///   page carries none
pub fn find_csrf_token(html: &str) -> Result<String, ConnectMlsError> {
    let document = Html::parse_document(html);

    document
        .select(&safe_static_selector(
            CSRF_SELECTOR.clone(),
            CSRF_SELECTOR_TEXT,
        )?)
        .filter_map(|input| input.value().attr("value"))
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ConnectMlsError::ProtocolError(
            "no CSRF token found on the login page".to_string(),
        ))
}

/// Get the exchange code from the authorization page
///
/// The authorize endpoint answers with a script that redirects to the tenant
/// sign-in page; the code follows the `&code=` marker up to the closing quote.
pub fn find_exchange_code(text: &str) -> Result<String, ConnectMlsError> {
    safe_static_regex(EXCHANGE_CODE_REGEX.clone(), EXCHANGE_CODE_REGEX_TEXT)?
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|code| code.as_str().to_string())
        .ok_or(ConnectMlsError::ProtocolError(
            "no exchange code found in the authorization response".to_string(),
        ))
}

/// Pick the tenant API host out of a list of cookie domains
///
/// The pattern has to match at the start of the domain; the matched part is
/// returned, so trailing text on the domain is dropped.
///
/// # Arguments
/// * `domains` - cookie domains, in jar order
/// * `pattern` - tenant host pattern
///
/// # Returns
/// * the first matching host, or `None` when no domain matches
pub fn extract_base_host<'a, I>(domains: I, pattern: &Regex) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    domains.into_iter().find_map(|domain| {
        pattern
            .find(domain)
            .filter(|m| m.start() == 0)
            .map(|m| m.as_str().to_string())
    })
}
