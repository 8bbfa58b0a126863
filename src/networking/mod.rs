//! # networking
//!
//! HTTP plumbing for the connectMLS portal.
//!
//! This module provides:
//! - HTTP client configuration around a listable cookie jar
//! - The browser-style login handshake (CSRF token, credential check, code exchange)
//! - A base client for the tenant API with raw or decoded-JSON responses
//!
//! ## Usage - Blocking (default)
//!
//! ```no_run
//! use connectmls_api::networking::{BaseClient, ResponseMode, get_auth_cookies, get_login_info, tenant_base_url};
//! use connectmls_api::ClientConfig;
//!
//! let config = ClientConfig::default();
//! let login = get_login_info("log.txt").expect("Failed to read login file");
//! let cookies = get_auth_cookies(&login, &config).expect("Login failed");
//! let base_url = tenant_base_url(&cookies, &config.portal).expect("No tenant cookie");
//!
//! let client = BaseClient::new(&config, cookies, base_url).expect("Failed to create client");
//! let version = client
//!     .get("/api/clippy/version", None, ResponseMode::Decoded)
//!     .expect("Request failed");
//! ```

// Module declarations
pub mod auth;
pub mod client;
pub mod cookies;

// Re-export commonly used items for convenience
pub use auth::blocking::{get_auth_cookies, tenant_base_url};
pub use auth::{LoginInfo, get_login_info};
pub use client::blocking::{BaseClient, RequestBody, create_client, get_page};
pub use client::{ApiResponse, DecodeFailure, JsonBody, ResponseMode};
pub use cookies::{Cookie, CookieJar};

// Re-export types from dependencies for convenience
pub use reqwest::Error as NetworkError;
pub use reqwest::blocking::Response;
