//! Credential types for the share session probe
//!
//! SECURITY: Password types implement Drop to clear sensitive data.

use crate::utils::ConfigError;
use std::fmt;

/// Share username
///
/// The domain is carried separately in [`ShareCredentials`], so this is the
/// bare account name as given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Create a new username after validation
    pub fn new(username: impl Into<String>) -> Result<Self, ConfigError> {
        let username = username.into();

        if username.is_empty() {
            return Err(ConfigError::InvalidUsername(
                "Username cannot be empty".to_string(),
            ));
        }

        if username.len() > 256 {
            return Err(ConfigError::InvalidUsername(
                "Username exceeds maximum length (256)".to_string(),
            ));
        }

        Ok(Username(username))
    }

    /// Get the username as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Username {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Username::new(value)
    }
}

/// Password that zeros memory on drop
///
/// SECURITY: This type never implements Display or Debug in a way that reveals the password.
pub struct SecureString(String);

impl Clone for SecureString {
    fn clone(&self) -> Self {
        SecureString(self.0.clone())
    }
}

impl SecureString {
    pub fn new(password: impl Into<String>) -> Self {
        SecureString(password.into())
    }

    /// Get the password as a string slice
    ///
    /// Use this sparingly and only when handing the secret to a connector.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SecureString {
    fn default() -> Self {
        SecureString(String::new())
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        // SAFETY: We own this String and zero it in place; zero bytes are valid UTF-8
        unsafe {
            let bytes = self.0.as_bytes_mut();
            for byte in bytes {
                std::ptr::write_volatile(byte, 0);
            }
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(*** {} bytes ***)", self.0.len())
    }
}

/// Credentials presented to the share host
#[derive(Clone, Debug, Default)]
pub struct ShareCredentials {
    user: Option<Username>,
    domain: String,
    workstation: String,
    password: SecureString,
}

impl ShareCredentials {
    pub fn new(
        user: Option<Username>,
        domain: impl Into<String>,
        workstation: impl Into<String>,
        password: SecureString,
    ) -> Self {
        ShareCredentials {
            user,
            domain: domain.into(),
            workstation: workstation.into(),
            password,
        }
    }

    /// Account name, `None` for an anonymous session
    pub fn user(&self) -> Option<&Username> {
        self.user.as_ref()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn workstation(&self) -> &str {
        &self.workstation
    }

    pub fn password(&self) -> &SecureString {
        &self.password
    }

    /// `DOMAIN\user`, `user` or `<anonymous>` for log lines
    pub fn display_account(&self) -> String {
        match (&self.user, self.domain.is_empty()) {
            (Some(user), false) => format!("{}\\{}", self.domain, user),
            (Some(user), true) => user.to_string(),
            (None, _) => "<anonymous>".to_string(),
        }
    }
}
