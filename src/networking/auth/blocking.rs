//! Blocking authentication implementation for connectMLS
//!
//! The portal has no API login; the flow replays what a browser does:
//! 1. open the login page (one redirect sets the pre-auth cookie) and scrape the CSRF token
//! 2. post the credentials to the credential check, which answers with a redirect
//! 3. follow that redirect to the authorize page and scrape the exchange code
//! 4. trade the code for session cookies on the tenant host
use super::LoginInfo;
use crate::config::{ClientConfig, Portal};
use crate::errors::ConnectMlsError;
use crate::extraction::{extract_base_host, find_csrf_token, find_exchange_code};
use crate::networking::client::blocking::{create_client, get_page, redacted, redirect_target};
use crate::networking::cookies::CookieJar;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::{Url, redirect};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the login page html
///
/// The entry URL redirects once to the login form; that redirect is what sets
/// the cookie the form needs.
pub fn get_login_page_html(client: &Client, portal: &Portal) -> Result<String, ConnectMlsError> {
    let response = client.get(portal.login_url.as_str()).send()?;
    let login_url = redirect_target(&response)?;
    debug!("Login page is at {}", redacted(&login_url));

    Ok(get_page(client, login_url, portal.max_redirects)?.text()?)
}

/// Submit the credentials and return the authorization redirect target
///
/// # Returns
/// * the `Location` the credential check redirected to
/// * [`ConnectMlsError::InvalidCredentials`] when that is the portal's failure URL
pub fn check_credentials(
    client: &Client,
    portal: &Portal,
    login: &LoginInfo,
    csrf_token: &str,
) -> Result<Url, ConnectMlsError> {
    let response = client
        .post(portal.credential_check_url.as_str())
        .query(&[
            ("_csrf", csrf_token),
            ("screenHeight", ""),
            ("screenWidth", ""),
            ("visitorid", ""),
            ("deviceType", ""),
            ("fromurl", "login.jsp"),
            ("j_username", &*login.username),
            ("j_password", &*login.password),
            ("loginInfo", ""),
        ])
        .send()?;

    let location = redirect_target(&response)?;
    if location.as_str() == portal.login_failure_url
        || Url::parse(&portal.login_failure_url).is_ok_and(|failure| failure == location)
    {
        return Err(ConnectMlsError::InvalidCredentials);
    }

    Ok(location)
}

/// Follow the authorization redirect and scrape the exchange code
pub fn get_slogin_code(client: &Client, portal: &Portal, authorize_url: Url) -> Result<String, ConnectMlsError> {
    let text = get_page(client, authorize_url, portal.max_redirects)?.text()?;
    find_exchange_code(&text)
}

/// Trade the exchange code for session cookies on the tenant host
pub fn sign_in(client: &Client, cookies: &CookieJar, portal: &Portal, code: &str) -> Result<(), ConnectMlsError> {
    let base_url = tenant_base_url(cookies, portal)?;
    // the portal only checks that these are present
    let visitor_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string();

    let url = Url::parse_with_params(
        &format!("{}{}", base_url, portal.sign_in_path),
        &[
            ("swidth", "1440"),
            ("sheight", "900"),
            ("deviceType", "desktop"),
            ("visitorid", visitor_id.as_str()),
            ("code", code),
        ],
    )?;
    get_page(client, url, portal.max_redirects)?;

    Ok(())
}

/// Base URL of the tenant API, derived from the jar's cookie domains
pub fn tenant_base_url(cookies: &CookieJar, portal: &Portal) -> Result<String, ConnectMlsError> {
    let domains = cookies.domains();
    let host = extract_base_host(domains.iter().map(String::as_str), &portal.tenant_regex()?)
        .ok_or_else(|| {
            ConnectMlsError::ProtocolError(format!(
                "no cookie domain matches the tenant host pattern {}",
                portal.tenant_host_pattern
            ))
        })?;

    Ok(portal.tenant_base_url(&host))
}

/// Log in and return the authorised cookie jar
///
/// # Arguments
/// * `login` - portal username and password
/// * `config` - timeouts, user agent and portal endpoints
///
/// # Example
/// ```no_run
/// use connectmls_api::networking::{LoginInfo, get_auth_cookies};
/// use connectmls_api::ClientConfig;
/// let jar = get_auth_cookies(&LoginInfo::new("agent", "secret"), &ClientConfig::default())
///     .expect("login failed");
/// ```
pub fn get_auth_cookies(login: &LoginInfo, config: &ClientConfig) -> Result<Arc<CookieJar>, ConnectMlsError> {
    let cookies = Arc::new(CookieJar::new());
    let client = create_client(config, cookies.clone(), redirect::Policy::none())?;
    let portal = &config.portal;

    let login_html = get_login_page_html(&client, portal)?;
    let csrf_token = find_csrf_token(&login_html)?;
    debug!("Found CSRF token");

    let authorize_url = check_credentials(&client, portal, login, &csrf_token)?;
    debug!("Credentials accepted");

    let code = get_slogin_code(&client, portal, authorize_url)?;
    sign_in(&client, &cookies, portal, &code)?;
    info!("Logged in");

    Ok(cookies)
}
