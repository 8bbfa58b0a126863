//! Utility functions for markup parsing and JSON reshaping

use crate::errors::ConnectMlsError;
use regex::Regex;
use scraper::Selector;
use serde_json::{Map, Value};

/// Creates a selector from provided string
///
/// Internal utility function for parsing CSS selectors.
#[inline(always)]
pub(crate) fn make_selector(
    selector: &str,
) -> Result<Selector, scraper::error::SelectorErrorKind<'_>> {
    Selector::parse(selector)
}

/// Macro to create a static LazyLock
#[macro_export]
macro_rules! make_static {
    ($expr:expr) => {{ LazyLock::new(|| $expr) }};
}

pub(crate) fn safe_static_selector(
    selector: Option<Selector>,
    backup: &str,
) -> Result<Selector, ConnectMlsError> {
    selector.map(Ok).unwrap_or_else(|| {
        make_selector(backup)
            .map_err(|_| ConnectMlsError::SelectorError("Failed to create CSS selector".to_string()))
    })
}

pub(crate) fn safe_static_regex(
    regex: Option<Regex>,
    backup: &str,
) -> Result<Regex, ConnectMlsError> {
    regex.map(Ok).unwrap_or_else(|| {
        Regex::new(backup)
            .map_err(|_| ConnectMlsError::RegexError("Failed to compile regex".to_string()))
    })
}

#[macro_export]
macro_rules! define_selector {
    ($name:ident, $name_text:ident, $text:expr) => {
        static $name_text: &str = $text;

        static $name: LazyLock<Option<Selector>> = $crate::make_static!(make_selector($text).ok());
    };
}
#[macro_export]
macro_rules! define_regex {
    ($name:ident, $name_text:ident, $text:expr) => {
        static $name_text: &str = $text;

        static $name: LazyLock<std::option::Option<regex::Regex>> =
            $crate::make_static!({ Regex::new($text).ok() });
    };
}

/// Keep only the requested keys of a JSON object
///
/// # Arguments
/// * `input` - decoded JSON object to filter
/// * `keys` - keys to keep; keys absent from `input` are skipped
///
/// # Returns
/// * a new object holding the requested keys in the order they were asked for
pub fn focus_keys<S: AsRef<str>>(input: &Map<String, Value>, keys: &[S]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| {
            let key = key.as_ref();
            input.get(key).map(|value| (key.to_string(), value.clone()))
        })
        .collect()
}
