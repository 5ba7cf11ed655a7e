// Credentials file persistence
//
// The cloud backend re-reads the credentials file during token refresh,
// so the file must exist for the whole lifetime of a session. It is
// written with owner-only permissions and recreated on demand when an
// external cleanup removed it.

use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::Error;

pub const CREDENTIALS_FILE_NAME: &str = "getair_credentials.json";

/// Location and bookkeeping for the on-disk credentials file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store the file under the caller's persistent storage directory.
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            path: storage_dir.join(CREDENTIALS_FILE_NAME),
        }
    }

    /// Fallback store under the system temp directory. The file name
    /// embeds a hash of the username so parallel accounts on one host
    /// don't clobber each other.
    pub fn in_temp_dir(username: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        username.hash(&mut hasher);
        let name = format!(".getair_credentials_{:016x}", hasher.finish());
        let path = std::env::temp_dir().join(name);
        warn!(
            "no storage directory configured, using temporary path {}",
            path.display()
        );
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the credentials file, creating parent directories and
    /// restricting permissions to the owner.
    pub fn write(&self, credentials: &Credentials) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = json!({
            "auth_url": credentials.auth_url.as_str(),
            "api_url": credentials.api_url.as_str(),
            "client_id": credentials.client_id,
            "username": credentials.username,
            "password": credentials.password.expose_secret(),
        });

        fs::write(&self.path, body.to_string())?;
        restrict_permissions(&self.path)?;

        debug!("credentials written to {}", self.path.display());
        Ok(())
    }

    /// Recreate the file if it went missing.
    pub fn ensure(&self, credentials: &Credentials) -> Result<(), Error> {
        if self.path.exists() {
            return Ok(());
        }
        warn!(
            "credentials file missing at {}, recreating",
            self.path.display()
        );
        self.write(credentials)
    }

    /// Delete the file on teardown. A file that is already gone is fine.
    pub fn remove(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("removed credentials file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::CredentialStore(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), Error> {
    Ok(())
}
