//! Session cookies captured from an already logged-in browser.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// One cookie injected into the browser before any authenticated page loads.
pub struct SessionCredential {
    name: String,
    value: SecretString,
}

impl SessionCredential {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SecretString::from(value.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw cookie value. Only the navigator should need this.
    pub fn value(&self) -> &str {
        self.value.expose_secret()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Cookie entry as written by browser cookie-export extensions.
///
/// ```json
/// [
///   { "name": "ssid", "content": "ghy-0912..." },
///   { "name": "orgnickp", "content": "JOHNDOE" }
/// ]
/// ```
///
/// Extra fields (domain, path, expiry...) are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ExportedCookie {
    pub name: String,
    pub content: String,
}

impl From<ExportedCookie> for SessionCredential {
    fn from(cookie: ExportedCookie) -> Self {
        SessionCredential::new(cookie.name, cookie.content)
    }
}
