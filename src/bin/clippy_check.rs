//! Log in and print the portal API version.
//!
//! Usage: `clippy_check <login-file> [config.json]`

use connectmls_api::networking::get_login_info;
use connectmls_api::{Client, ClientConfig, ConnectMlsError, ResponseMode};
use log::error;
use std::env;
use std::process::ExitCode;

fn run() -> Result<(), ConnectMlsError> {
    let mut args = env::args().skip(1);
    let login_file = args.next().ok_or_else(|| {
        ConnectMlsError::ConfigError("usage: clippy_check <login-file> [config.json]".to_string())
    })?;
    let config = match args.next() {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    let client = Client::new(&get_login_info(login_file)?, &config)?;
    let version = client
        .clippy_test(ResponseMode::Decoded)?
        .into_decoded()
        .map(|body| body.to_value())
        .unwrap_or_default();
    println!("{}", version);
    Ok(())
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
