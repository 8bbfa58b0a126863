//! Blocking HTTP client implementation for connectMLS

use super::{ApiResponse, JsonBody, ResponseMode};
use crate::config::ClientConfig;
use crate::errors::ConnectMlsError;
use crate::networking::cookies::CookieJar;
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::{Url, header, redirect};
use serde_json::Value;
use std::sync::Arc;

/// Create a configured HTTP client sharing the given cookie jar
///
/// # Arguments
/// * `config` - timeouts and user agent
/// * `cookies` - jar the client reads from and refreshes
/// * `policy` - redirect policy; the login flow follows redirects by hand
///
/// # Example
/// ```no_run
/// use connectmls_api::networking::{CookieJar, create_client};
/// use connectmls_api::ClientConfig;
/// use reqwest::redirect::Policy;
/// use std::sync::Arc;
/// let client = create_client(&ClientConfig::default(), Arc::new(CookieJar::new()), Policy::none())
///     .expect("Failed to create client");
/// ```
pub fn create_client(
    config: &ClientConfig,
    cookies: Arc<CookieJar>,
    policy: redirect::Policy,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .redirect(policy)
        .cookie_provider(cookies)
        .connect_timeout(config.connect_timeout())
        .timeout(config.read_timeout())
        .user_agent(config.user_agent.as_str())
        .build()
}

/// Get the requested URL, following up to `max_redirects` redirects by hand
///
/// The client is expected to have redirects disabled, so each hop goes through
/// the cookie jar before the next request is made.
///
/// # Returns
/// * the first non-redirect response
pub fn get_page(client: &Client, url: Url, max_redirects: usize) -> Result<Response, ConnectMlsError> {
    let mut url = url;
    for _ in 0..=max_redirects {
        debug!("Did request to {}", redacted(&url));
        let response = client.get(url.clone()).send()?;
        debug!("{}", response.status());

        if !response.status().is_redirection() {
            return Ok(response);
        }
        url = redirect_target(&response)?;
        debug!("Following redirect");
    }

    Err(ConnectMlsError::ProtocolError(format!(
        "more than {} redirects",
        max_redirects
    )))
}

/// Resolve the `Location` header of a redirect against the response URL
pub fn redirect_target(response: &Response) -> Result<Url, ConnectMlsError> {
    let location = response
        .headers()
        .get(header::LOCATION)
        .ok_or_else(|| {
            ConnectMlsError::ProtocolError(format!(
                "{} answered {} without a Location header",
                redacted(response.url()),
                response.status()
            ))
        })?
        .to_str()
        .map_err(|_| ConnectMlsError::ProtocolError("Location header is not text".to_string()))?;

    Ok(response.url().join(location)?)
}

/// URL without its query, which can carry credentials or codes
pub(crate) fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Body of a POST request
#[derive(Debug, Clone, Copy)]
pub enum RequestBody<'a> {
    Json(&'a Value),
    /// Sent as is, without a content type.
    Text(&'a str),
}

/// Session-bound client for the tenant API
///
/// Owns the HTTP client and the cookie jar it was built with. Paths are
/// appended to the tenant base URL verbatim.
#[derive(Debug)]
pub struct BaseClient {
    http: Client,
    cookies: Arc<CookieJar>,
    base_url: String,
}

impl BaseClient {
    pub fn new(
        config: &ClientConfig,
        cookies: Arc<CookieJar>,
        base_url: String,
    ) -> Result<Self, ConnectMlsError> {
        let http = create_client(config, cookies.clone(), redirect::Policy::default())?;
        Ok(BaseClient {
            http,
            cookies,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    /// GET `path`, optionally with a JSON body, returning the response as received
    pub fn get_response(&self, path: &str, json: Option<&Value>) -> Result<Response, ConnectMlsError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", path);
        let mut request = self.http.get(url);
        if let Some(json) = json {
            request = request.json(json);
        }
        Ok(request.send()?)
    }

    /// POST `path` with `body`, returning the response as received
    pub fn post_response(&self, path: &str, body: RequestBody<'_>) -> Result<Response, ConnectMlsError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", path);
        let request = match body {
            RequestBody::Json(json) => self.http.post(url).json(json),
            RequestBody::Text(text) => self.http.post(url).body(text.to_string()),
        };
        Ok(request.send()?)
    }

    pub fn get(&self, path: &str, json: Option<&Value>, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        let response = self.get_response(path, json)?;
        self.reply(response, mode)
    }

    pub fn post(&self, path: &str, body: RequestBody<'_>, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        let response = self.post_response(path, body)?;
        self.reply(response, mode)
    }

    /// Decode a response body as JSON
    ///
    /// Never fails on malformed JSON; only reading the body can fail.
    pub fn to_json(&self, response: Response) -> Result<JsonBody, ConnectMlsError> {
        let text = response.text()?;
        let body = JsonBody::decode(text);
        if body.is_malformed() {
            debug!("Response body is not JSON");
        }
        Ok(body)
    }

    pub fn reply(&self, response: Response, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        match mode {
            ResponseMode::Raw => Ok(ApiResponse::Raw(response)),
            ResponseMode::Decoded => self.to_json(response).map(ApiResponse::Decoded),
        }
    }
}
