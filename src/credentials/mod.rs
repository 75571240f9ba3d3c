//! Loading the session cookies handed to the harvester.
//!
//! The harvester never logs in. It assumes an existing session by injecting
//! cookies exported from a browser where the user is already signed in.
//!
//! Accepted files end in `.json` or `.txt`. Only JSON exports can be read
//! today; a `.txt` file passes validation but is refused at load time because
//! its layout has never been defined.

mod session;

pub use session::SessionCredential;

use std::path::{Path, PathBuf};

use session::ExportedCookie;

/// Problems with the credential file that should be reported to the user
/// rather than surfaced as a crash.
#[derive(Debug, thiserror::Error)]
pub enum CredentialFileError {
    #[error("Cookies file must be in json or txt format")]
    UnsupportedExtension { path: PathBuf },

    #[error("Cookies file does not exist")]
    NotFound { path: PathBuf },

    #[error("Cookies in txt format are not supported yet, export them as json")]
    TextFormatUnsupported { path: PathBuf },

    #[error("Failed to read cookies file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse cookies file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Cookie file formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFormat {
    Json,
    Text,
}

/// Check the extension and existence of a credential file.
pub fn validate_credentials_file(path: &Path) -> Result<CredentialFormat, CredentialFileError> {
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => CredentialFormat::Json,
        Some("txt") => CredentialFormat::Text,
        _ => {
            return Err(CredentialFileError::UnsupportedExtension {
                path: path.to_path_buf(),
            })
        }
    };

    if !path.exists() {
        return Err(CredentialFileError::NotFound {
            path: path.to_path_buf(),
        });
    }

    Ok(format)
}

/// Validate and load session cookies from `path`.
pub fn load_credentials(path: &Path) -> Result<Vec<SessionCredential>, CredentialFileError> {
    match validate_credentials_file(path)? {
        CredentialFormat::Json => {
            let content =
                std::fs::read_to_string(path).map_err(|source| CredentialFileError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            parse_credentials_json(&content).map_err(|source| CredentialFileError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
        CredentialFormat::Text => Err(CredentialFileError::TextFormatUnsupported {
            path: path.to_path_buf(),
        }),
    }
}

/// Parse a JSON cookie export (an array of `{ "name", "content" }` objects).
pub fn parse_credentials_json(json: &str) -> Result<Vec<SessionCredential>, serde_json::Error> {
    let cookies: Vec<ExportedCookie> = serde_json::from_str(json)?;
    Ok(cookies.into_iter().map(SessionCredential::from).collect())
}
