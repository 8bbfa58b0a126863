//! Session cookie jar
//!
//! [`CookieJar`] is the cookie store handed to reqwest, so every response
//! refreshes it and every request reads from it. Unlike reqwest's own jar it
//! can list what it holds, which the client needs to find the tenant host.
//!
//! Parsing covers the subset of `Set-Cookie` the portal uses: `Domain`
//! (leading dot stripped), `Path`, `Secure`, `Max-Age` and `Expires`. A
//! `Max-Age` of zero or less, or an `Expires` date in the past, deletes the
//! cookie; `Max-Age` wins when both are present. Values are kept verbatim,
//! quotes included.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use std::sync::{PoisonError, RwLock};

/// One stored cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub name: String,
    pub value: String,
    pub path: String,
    pub secure: bool,
    /// Set when the response carried no `Domain` attribute: only sent back to
    /// the exact host.
    pub host_only: bool,
}

impl Cookie {
    /// A host-only cookie valid for every path of `domain`
    pub fn new(domain: &str, name: &str, value: &str) -> Self {
        Cookie {
            domain: domain.to_ascii_lowercase(),
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            secure: false,
            host_only: true,
        }
    }

    fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            host == self.domain || host.ends_with(&format!(".{}", self.domain))
        };

        domain_ok && path_matches(&self.path, url.path()) && (!self.secure || url.scheme() == "https")
    }
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')))
}

fn default_path(url: &Url) -> String {
    match url.path().rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => "/".to_string(),
    }
}

/// Parse an `Expires` date, in the RFC 1123 form or the older dashed form
fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%a, %d-%b-%Y %H:%M:%S GMT")
                .ok()
                .map(|date| date.and_utc())
        })
}

enum Parsed {
    Store(Cookie),
    Remove(Cookie),
}

fn parse_set_cookie(header: &str, url: &Url) -> Option<Parsed> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let mut cookie = Cookie {
        domain: host,
        name: name.to_string(),
        value: value.trim().to_string(),
        path: default_path(url),
        secure: false,
        host_only: true,
    };
    let mut max_age: Option<i64> = None;
    let mut expires: Option<DateTime<Utc>> = None;

    for part in parts {
        let part = part.trim();
        match part.split_once('=') {
            Some((k, v)) => match k.trim().to_ascii_lowercase().as_str() {
                "domain" => {
                    let v = v.trim().trim_start_matches('.').to_ascii_lowercase();
                    if !v.is_empty() {
                        cookie.domain = v;
                        cookie.host_only = false;
                    }
                }
                "path" if v.starts_with('/') => cookie.path = v.trim().to_string(),
                "max-age" => max_age = v.trim().parse::<i64>().ok(),
                "expires" => expires = parse_expires(v),
                _ => {}
            },
            None if part.eq_ignore_ascii_case("secure") => cookie.secure = true,
            None => {}
        }
    }

    let expired = match max_age {
        Some(age) => age <= 0,
        None => expires.is_some_and(|date| date <= Utc::now()),
    };

    Some(if expired {
        Parsed::Remove(cookie)
    } else {
        Parsed::Store(cookie)
    })
}

/// In-memory cookie jar owned by one client session
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<Vec<Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie, replacing any with the same domain, path and name
    pub fn insert(&self, cookie: Cookie) {
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        match cookies.iter_mut().find(|c| same_slot(c, &cookie)) {
            Some(existing) => *existing = cookie,
            None => cookies.push(cookie),
        }
    }

    fn remove(&self, cookie: &Cookie) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|c| !same_slot(c, cookie));
    }

    /// Distinct cookie domains, in the order they were first stored
    pub fn domains(&self) -> Vec<String> {
        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        let mut domains: Vec<String> = Vec::new();
        for cookie in cookies.iter() {
            if !domains.contains(&cookie.domain) {
                domains.push(cookie.domain.clone());
            }
        }
        domains
    }

    /// Snapshot of every stored cookie
    pub fn all(&self) -> Vec<Cookie> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, domain: &str, name: &str) -> Option<Cookie> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.domain == domain && c.name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cookies.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn same_slot(a: &Cookie, b: &Cookie) -> bool {
    a.domain == b.domain && a.path == b.path && a.name == b.name
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let Ok(header) = header.to_str() else {
                continue;
            };
            match parse_set_cookie(header, url) {
                Some(Parsed::Store(cookie)) => {
                    debug!("Storing cookie {} for {}", cookie.name, cookie.domain);
                    self.insert(cookie);
                }
                Some(Parsed::Remove(cookie)) => {
                    debug!("Removing cookie {} for {}", cookie.name, cookie.domain);
                    self.remove(&cookie);
                }
                None => {}
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        let header = cookies
            .iter()
            .filter(|c| c.matches(url))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            HeaderValue::from_str(&header).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(jar: &CookieJar, url: &str, headers: &[&'static str]) {
        let url = Url::parse(url).unwrap();
        let values: Vec<HeaderValue> = headers.iter().map(|h| HeaderValue::from_static(*h)).collect();
        jar.set_cookies(&mut values.iter(), &url);
    }

    fn header_for(jar: &CookieJar, url: &str) -> Option<String> {
        jar.cookies(&Url::parse(url).unwrap())
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn host_only_cookie_lists_its_host() {
        let jar = CookieJar::new();
        store(
            &jar,
            "https://connectmls3.mredllc.com/slogin.jsp",
            &["JSESSIONID=abc; Path=/; HttpOnly"],
        );

        assert_eq!(jar.domains(), vec!["connectmls3.mredllc.com".to_string()]);
        assert_eq!(
            header_for(&jar, "https://connectmls3.mredllc.com/api/clippy/version").as_deref(),
            Some("JSESSIONID=abc")
        );
        assert_eq!(header_for(&jar, "https://connectmls4.mredllc.com/"), None);
    }

    #[test]
    fn domain_cookie_covers_subdomains() {
        let jar = CookieJar::new();
        store(
            &jar,
            "https://connectmls-api.mredllc.com/oid/login",
            &["AWSALB=xyz; Domain=.mredllc.com; Path=/"],
        );

        assert_eq!(jar.domains(), vec!["mredllc.com".to_string()]);
        assert!(header_for(&jar, "https://connectmls3.mredllc.com/").is_some());
    }

    #[test]
    fn default_path_is_request_directory() {
        let jar = CookieJar::new();
        store(&jar, "https://connectmls-api.mredllc.com/oid/login", &["SID=1"]);

        assert_eq!(jar.all()[0].path, "/oid");
        assert!(header_for(&jar, "https://connectmls-api.mredllc.com/oid/authorize").is_some());
        assert!(header_for(&jar, "https://connectmls-api.mredllc.com/slogin.jsp").is_none());
    }

    #[test]
    fn secure_cookie_not_sent_over_http() {
        let jar = CookieJar::new();
        store(&jar, "https://portal.test/", &["S=1; Secure; Path=/"]);

        assert!(header_for(&jar, "http://portal.test/").is_none());
        assert!(header_for(&jar, "https://portal.test/").is_some());
    }

    #[test]
    fn later_cookie_replaces_and_max_age_zero_removes() {
        let jar = CookieJar::new();
        store(&jar, "https://portal.test/", &["S=1; Path=/", "T=2; Path=/"]);
        store(&jar, "https://portal.test/", &["S=3; Path=/"]);

        assert_eq!(jar.len(), 2);
        assert_eq!(jar.get("portal.test", "S").unwrap().value, "3");

        store(&jar, "https://portal.test/", &["S=; Path=/; Max-Age=0"]);
        assert!(jar.get("portal.test", "S").is_none());
        assert_eq!(header_for(&jar, "https://portal.test/").as_deref(), Some("T=2"));
    }

    #[test]
    fn past_expires_removes() {
        let jar = CookieJar::new();
        store(&jar, "https://portal.test/", &["SID=abc; Path=/"]);
        store(
            &jar,
            "https://portal.test/",
            &["SID=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT"],
        );

        assert!(jar.get("portal.test", "SID").is_none());
        assert_eq!(header_for(&jar, "https://portal.test/"), None);
    }

    #[test]
    fn dashed_expires_in_past_removes() {
        let jar = CookieJar::new();
        store(&jar, "https://portal.test/", &["SID=abc; Path=/"]);
        store(
            &jar,
            "https://portal.test/",
            &["SID=; Path=/; Expires=Thu, 01-Jan-1970 00:00:00 GMT"],
        );

        assert!(jar.is_empty());
    }

    #[test]
    fn future_expires_keeps_and_max_age_wins() {
        let jar = CookieJar::new();
        store(
            &jar,
            "https://portal.test/",
            &[
                "A=1; Path=/; Expires=Fri, 01 Jan 2100 00:00:00 GMT",
                "B=2; Path=/; Max-Age=3600; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
                "C=3; Path=/; Expires=not a date",
            ],
        );

        assert_eq!(
            header_for(&jar, "https://portal.test/").as_deref(),
            Some("A=1; B=2; C=3")
        );
    }

    #[test]
    fn quoted_value_sent_back_verbatim() {
        let jar = CookieJar::new();
        store(&jar, "https://portal.test/", &["PREF=\"a b\"; Path=/"]);

        assert_eq!(jar.get("portal.test", "PREF").unwrap().value, "\"a b\"");
        assert_eq!(
            header_for(&jar, "https://portal.test/").as_deref(),
            Some("PREF=\"a b\"")
        );
    }

    #[test]
    fn malformed_headers_are_ignored() {
        let jar = CookieJar::new();
        store(&jar, "https://portal.test/", &["no-equals-sign", "=orphan"]);
        assert!(jar.is_empty());
    }
}
