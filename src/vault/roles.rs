//! Credential role resolution for engine mounts.
//!
//! Each mount managed by this service carries exactly one credential role.
//! Role names are chosen by callers at creation time and are not stored
//! relationally, so operations that need the role discover it by listing the
//! mount. Zero or multiple roles mean the mount is not in a state this
//! service produced, and resolution refuses to guess.

use crate::errors::{Error, Result};
use crate::vault::VaultClient;

/// Resolves the single credential role on a mount.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    client: VaultClient,
}

impl RoleResolver {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }

    /// Return the name of the only role on the mount.
    pub async fn resolve(&self, mount_path: &str) -> Result<String> {
        let mut roles = self.client.list_roles(mount_path).await?;

        match roles.len() {
            1 => Ok(roles.remove(0)),
            0 => Err(Error::role_resolution(format!(
                "No credential role found on mount '{}'",
                mount_path
            ))),
            count => Err(Error::role_resolution(format!(
                "Expected one credential role on mount '{}', found {}",
                mount_path, count
            ))),
        }
    }
}
