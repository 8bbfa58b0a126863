//! # connectmls-api
//!
//! A blocking client for the connectMLS real-estate portal.
//!
//! The portal has no public API: [`Client::new`] replays the browser login
//! (CSRF token, credential check, code exchange), finds the tenant API host in
//! the resulting session cookies and then issues authenticated calls to search,
//! count, export and download listings.
//!
//! ```no_run
//! use connectmls_api::{Client, ClientConfig, ResponseMode, networking::get_login_info};
//!
//! let login = get_login_info("log.txt").expect("Failed to read login file");
//! let client = Client::new(&login, &ClientConfig::default()).expect("Login failed");
//! let version = client.clippy_test(ResponseMode::Decoded).expect("Not authorised");
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod export;
pub mod extraction;
pub mod networking;
pub mod utils;

pub use client::{Client, Download, DownloadOptions};
pub use config::{ClientConfig, Portal};
pub use errors::ConnectMlsError;
pub use export::ExportFormat;
pub use networking::{ApiResponse, JsonBody, LoginInfo, ResponseMode};
