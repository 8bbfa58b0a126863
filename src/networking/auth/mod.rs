//! Credentials and the portal login flow

pub mod blocking;

use crate::errors::ConnectMlsError;
use std::fmt;
use std::fs;
use std::path::Path;

/// Login information for connectMLS authentication
#[derive(Clone)]
pub struct LoginInfo {
    pub username: Box<str>,
    pub password: Box<str>,
}

impl LoginInfo {
    pub fn new(username: &str, password: &str) -> Self {
        LoginInfo {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInfo")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Get login information from text file at provided path
///
/// # Arguments
/// * `path` - Path to login file (username on first line, password on second)
///
/// # Returns
/// * Returns LoginInfo struct with username and password
///
/// # Example
/// ```no_run
/// use connectmls_api::networking::get_login_info;
/// let info = get_login_info("log.txt").expect("failed to read login file");
/// ```
pub fn get_login_info<P: AsRef<Path>>(path: P) -> Result<LoginInfo, ConnectMlsError> {
    let file = fs::read_to_string(path)?;
    let mut lines = file.lines().map(str::trim_end);
    let username = lines
        .next()
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ConnectMlsError::ConfigError("Username not found".to_string()))?;
    let password = lines
        .next()
        .ok_or_else(|| ConnectMlsError::ConfigError("Password not found".to_string()))?;

    Ok(LoginInfo::new(username, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_file_two_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "agent42\r\nhunter2\n").unwrap();

        let info = get_login_info(&path).unwrap();
        assert_eq!(&*info.username, "agent42");
        assert_eq!(&*info.password, "hunter2");
    }

    #[test]
    fn login_file_without_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "agent42\n").unwrap();

        assert!(matches!(
            get_login_info(&path),
            Err(ConnectMlsError::ConfigError(_))
        ));
    }

    #[test]
    fn debug_hides_password() {
        let info = LoginInfo::new("agent42", "hunter2");
        assert!(!format!("{:?}", info).contains("hunter2"));
    }
}
