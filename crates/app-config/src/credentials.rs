// In crates/app-config/src/credentials.rs

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Login triple for the trading terminal.
///
/// Stored in clear text on disk. This is a known weakness: anyone with read
/// access to the file gets the account password.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: u64,
    pub password: String,
    pub server: String,
}

impl Credentials {
    /// Builds credentials from user input. The login must be an account number.
    pub fn new(login: &str, password: impl Into<String>, server: impl Into<String>) -> Result<Self> {
        let login = login
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidLogin(login.to_string()))?;
        Ok(Self { login, password: password.into(), server: server.into() })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

/// Writes the credentials to `path` as TOML.
pub fn save_credentials(path: &Path, credentials: &Credentials) -> Result<()> {
    let content = toml::to_string(credentials)?;
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::warn!(path = %path.display(), "Login information saved in clear text.");
    Ok(())
}

/// Reads previously saved credentials from `path`.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    if !path.exists() {
        return Err(Error::MissingCredentials(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let credentials: Credentials = toml::from_str(&content)?;
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let creds = Credentials::new("51234567", "hunter2", "Broker-Demo").unwrap();

        save_credentials(&path, &creds).unwrap();
        let loaded = load_credentials(&path).unwrap();

        assert_eq!(loaded, creds);
        assert_eq!(loaded.login, 51234567);
    }

    #[test]
    fn login_must_be_numeric() {
        let err = Credentials::new("trader-one", "pw", "Broker-Live").unwrap_err();
        assert!(matches!(err, Error::InvalidLogin(login) if login == "trader-one"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_credentials(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)));
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials::new("1", "s3cret", "srv").unwrap();
        let shown = format!("{creds:?}");
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("redacted"));
    }
}
