//! # client
//!
//! The connectMLS API client.
//!
//! [`Client`] logs in on construction and exposes one method per portal
//! endpoint. Most methods take a [`ResponseMode`]: `Decoded` returns the JSON
//! body (with any post-processing the method describes applied), `Raw` returns
//! the HTTP response untouched.
//!
//! ## Usage
//!
//! ```no_run
//! use connectmls_api::{Client, ClientConfig, LoginInfo, ResponseMode};
//! use serde_json::json;
//!
//! let client = Client::new(&LoginInfo::new("agent", "secret"), &ClientConfig::default())
//!     .expect("Login failed");
//! let count = client
//!     .get_listings_count(&json!({"searchclass": "RE"}), true, ResponseMode::Decoded)
//!     .expect("Count failed");
//! ```

use crate::config::ClientConfig;
use crate::errors::ConnectMlsError;
use crate::export::{ExportFormat, write_export};
use crate::networking::{
    ApiResponse, BaseClient, CookieJar, LoginInfo, RequestBody, ResponseMode,
    get_auth_cookies, tenant_base_url,
};
use crate::utils::focus_keys;
use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::Response;
use serde_json::{Value, json};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

const SEARCH_PATH: &str = "/api/search/listing/list";
const LISTING_IDS_PATH: &str = "/api/search/listing/download";
const COUNT_PATH: &str = "/api/search/listing/count";
const DETAILS_PATH: &str = "/api/search/listing/details/data/LISTING";
const EXPORT_PATH: &str = "/api/listing/mylistings/export";
const EXPORT_OPTIONS_PATH: &str = "/api/listing/mylistings/exportoptions";
const CUSTOM_TABLE_PATH: &str = "/api/reports/custom/save";
const CLIPPY_PATH: &str = "/api/clippy/version";

/// How `download` should deliver the export
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Return the downloaded bytes instead of writing a file.
    pub receive_bytes: bool,
    /// Directory to write into; the working directory when `None`.
    pub directory: Option<PathBuf>,
}

/// What `download` produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    Bytes(Vec<u8>),
    Saved(PathBuf),
}

/// Authenticated connectMLS client
#[derive(Debug)]
pub struct Client {
    base: BaseClient,
}

impl Client {
    /// Log in and derive the tenant API host from the session cookies
    pub fn new(login: &LoginInfo, config: &ClientConfig) -> Result<Self, ConnectMlsError> {
        let cookies = get_auth_cookies(login, config)?;
        Self::with_cookies(cookies, config)
    }

    /// Build a client around a jar that is already authorised
    pub fn with_cookies(cookies: Arc<CookieJar>, config: &ClientConfig) -> Result<Self, ConnectMlsError> {
        let base_url = tenant_base_url(&cookies, &config.portal)?;
        info!("Using tenant API at {}", base_url);
        Ok(Client {
            base: BaseClient::new(config, cookies, base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.base_url()
    }

    pub fn cookies(&self) -> &CookieJar {
        self.base.cookies()
    }

    /// Search listings; the decoded results are returned unmodified
    pub fn search(&self, property_payload: &Value, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        self.base.post(SEARCH_PATH, RequestBody::Json(property_payload), mode)
    }

    /// Retrieve the listing IDs matching the payload
    ///
    /// # Arguments
    /// * `property_payload` - property type and parameters listings should match
    /// * `limit` - keep only the first N IDs; `None` keeps all of them. Ignored
    ///   in `Raw` mode, but a negative limit is always rejected
    /// * `mode` - decoded JSON or the raw response
    ///
    /// # Returns
    /// * `{"ids": [...]}` when a limit is given, the full decoded body otherwise
    pub fn get_listings_ids(
        &self,
        property_payload: &Value,
        limit: Option<i64>,
        mode: ResponseMode,
    ) -> Result<ApiResponse, ConnectMlsError> {
        let limit = limit
            .map(|l| usize::try_from(l).map_err(|_| ConnectMlsError::NegativeLimit(l)))
            .transpose()?;

        let response = self
            .base
            .post(LISTING_IDS_PATH, RequestBody::Json(property_payload), mode)?;

        match limit {
            Some(limit) => post_process(response, |value| truncate_ids(value, limit)),
            None => Ok(response),
        }
    }

    /// Get the name and location of a freshly generated export file
    pub fn get_export_file_info(
        &self,
        export_payload: &Value,
        mode: ResponseMode,
    ) -> Result<ApiResponse, ConnectMlsError> {
        self.base.post(EXPORT_PATH, RequestBody::Json(export_payload), mode)
    }

    /// Generate an export and download it
    ///
    /// Without `receive_bytes` the file is written as `<filename>.xlsx` or
    /// `<filename>.tsv` depending on the payload's `type` (`XLS` or `TSV`, any
    /// case); any other type is rejected before the export is requested.
    ///
    /// # Example
    /// ```no_run
    /// # use connectmls_api::{Client, ClientConfig, DownloadOptions, LoginInfo};
    /// # use serde_json::json;
    /// # let client = Client::new(&LoginInfo::new("agent", "secret"), &ClientConfig::default()).unwrap();
    /// let payload = json!({"type": "XLS", "ids": ["11893301"], "reportid": "31"});
    /// client.download(&payload, &DownloadOptions::default()).expect("Download failed");
    /// ```
    pub fn download(&self, export_payload: &Value, options: &DownloadOptions) -> Result<Download, ConnectMlsError> {
        let format = if options.receive_bytes {
            None
        } else {
            Some(export_format(export_payload)?)
        };

        let info = self.decoded_value(
            self.base
                .post_response(EXPORT_PATH, RequestBody::Json(export_payload))?,
        )?;
        let url = str_field(&info, "url")?;
        let filename = str_field(&info, "filename")?;
        debug!("Export file {} is ready", filename);

        // read_to_end applies the read timeout per read, not to the whole body
        let mut bytes = Vec::new();
        self.base.get_response(url, None)?.read_to_end(&mut bytes)?;

        match format {
            None => Ok(Download::Bytes(bytes)),
            Some(format) => write_export(format, filename, &bytes, options.directory.as_deref())
                .map(Download::Saved),
        }
    }

    fn export_options_response(&self, property_type: &str) -> Result<Response, ConnectMlsError> {
        let response = self.base.post_response(
            EXPORT_OPTIONS_PATH,
            RequestBody::Text(&property_type.to_uppercase()),
        )?;

        if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            return Err(ConnectMlsError::InvalidPropertyType(property_type.to_string()));
        }
        Ok(response)
    }

    /// Get the export options for a property type (for example `AT` for Attached Single)
    ///
    /// The portal answers an unknown property type with HTTP 500, reported as
    /// [`ConnectMlsError::InvalidPropertyType`] in either mode.
    pub fn get_export_options(&self, property_type: &str, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        let response = self.export_options_response(property_type)?;
        self.base.reply(response, mode)
    }

    /// Find a default or custom table by its label
    ///
    /// # Returns
    /// * the first table whose label equals `table_name`, or `None`
    pub fn get_table_id(&self, property_type: &str, table_name: &str) -> Result<Option<Value>, ConnectMlsError> {
        let options = self.decoded_value(self.export_options_response(property_type)?)?;
        find_table(&options, table_name)
    }

    /// Same lookup as [`Client::get_table_id`]
    pub fn get_table_info(&self, property_type: &str, table_name: &str) -> Result<Option<Value>, ConnectMlsError> {
        self.get_table_id(property_type, table_name)
    }

    /// Save a custom table to the profile
    pub fn create_custom_table(&self, table_payload: &Value, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        self.base.post(CUSTOM_TABLE_PATH, RequestBody::Json(table_payload), mode)
    }

    /// Check the session is authorised; the portal answers with its API version
    pub fn clippy_test(&self, mode: ResponseMode) -> Result<ApiResponse, ConnectMlsError> {
        self.base.get(CLIPPY_PATH, None, mode)
    }

    /// Get every detail available for a listing
    ///
    /// # Arguments
    /// * `property_type` - property type the listing belongs to
    /// * `listing_id` - listing to fetch
    /// * `focus_data` - return only `{"data": [...]}`
    /// * `fields` - keys to keep; with `focus_data` they filter the first
    ///   element of `data` instead of the top level
    /// * `mode` - decoded JSON or the raw response
    pub fn get_listing_details(
        &self,
        property_type: &str,
        listing_id: &str,
        focus_data: bool,
        fields: Option<&[&str]>,
        mode: ResponseMode,
    ) -> Result<ApiResponse, ConnectMlsError> {
        let path = format!("{}/{}/{}", DETAILS_PATH, property_type, listing_id);
        let response = self.base.get(&path, None, mode)?;

        post_process(response, |value| focus_details(value, focus_data, fields))
    }

    /// Count the listings matching the payload
    ///
    /// With `focus_count` only `{"count": n}` is kept, dropping fields such as
    /// `errors` and `top_errors`. Ignored in `Raw` mode.
    pub fn get_listings_count(
        &self,
        property_payload: &Value,
        focus_count: bool,
        mode: ResponseMode,
    ) -> Result<ApiResponse, ConnectMlsError> {
        let response = self
            .base
            .post(COUNT_PATH, RequestBody::Json(property_payload), mode)?;
        focus_count_field(response, focus_count)
    }

    /// [`Client::get_listings_count`] sent as a GET with a JSON body
    pub fn get_listing_count(
        &self,
        property_payload: &Value,
        focus_count: bool,
        mode: ResponseMode,
    ) -> Result<ApiResponse, ConnectMlsError> {
        let response = self.base.get(COUNT_PATH, Some(property_payload), mode)?;
        focus_count_field(response, focus_count)
    }

    fn decoded_value(&self, response: Response) -> Result<Value, ConnectMlsError> {
        self.base.to_json(response)?.into_value()
    }
}

fn post_process<F>(response: ApiResponse, f: F) -> Result<ApiResponse, ConnectMlsError>
where
    F: FnOnce(Value) -> Result<Value, ConnectMlsError>,
{
    match response {
        ApiResponse::Decoded(body) => body.try_map(f).map(ApiResponse::Decoded),
        raw => Ok(raw),
    }
}

fn focus_count_field(response: ApiResponse, focus_count: bool) -> Result<ApiResponse, ConnectMlsError> {
    if !focus_count {
        return Ok(response);
    }
    post_process(response, |value| {
        let count = value
            .get("count")
            .cloned()
            .ok_or_else(|| ConnectMlsError::MissingField("count".to_string()))?;
        Ok(json!({ "count": count }))
    })
}

fn truncate_ids(value: Value, limit: usize) -> Result<Value, ConnectMlsError> {
    let ids = value
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| ConnectMlsError::MissingField("ids".to_string()))?;

    Ok(json!({ "ids": ids.iter().take(limit).cloned().collect::<Vec<_>>() }))
}

fn focus_details(value: Value, focus_data: bool, fields: Option<&[&str]>) -> Result<Value, ConnectMlsError> {
    if focus_data {
        let mut data = value
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ConnectMlsError::MissingField("data".to_string()))?;

        if let (Some(fields), Some(Value::Object(first))) = (fields, data.first_mut()) {
            *first = focus_keys(first, fields);
        }
        return Ok(json!({ "data": data }));
    }

    let Some(fields) = fields else {
        return Ok(value);
    };
    match value.as_object() {
        Some(map) => Ok(Value::Object(focus_keys(map, fields))),
        None => Err(ConnectMlsError::ProtocolError(
            "listing details are not a JSON object".to_string(),
        )),
    }
}

fn find_table(options: &Value, table_name: &str) -> Result<Option<Value>, ConnectMlsError> {
    let tables = options
        .pointer("/reports/options")
        .and_then(Value::as_array)
        .ok_or_else(|| ConnectMlsError::MissingField("reports.options".to_string()))?;

    Ok(tables
        .iter()
        .find(|table| table.get("label").and_then(Value::as_str) == Some(table_name))
        .cloned())
}

fn export_format(export_payload: &Value) -> Result<ExportFormat, ConnectMlsError> {
    str_field(export_payload, "type")?.parse()
}

fn str_field<'a>(value: &'a Value, key: &str) -> Result<&'a str, ConnectMlsError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ConnectMlsError::MissingField(key.to_string()))
}
