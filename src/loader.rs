//! Service metadata loading from various sources.
//!
//! Handles loading CSDL JSON documents from files, strings, and HTTP URLs.
//! Documents are kept as text; parsing happens when the model is read.

use std::path::Path;

use crate::error::ReadError;
use crate::types::ServiceMetadata;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load service metadata from a CSDL JSON file.
///
/// # Errors
///
/// Returns `ReadError::FileNotFound` if the file doesn't exist,
/// or `ReadError::ReadError` if it cannot be read.
pub fn load_metadata(path: &Path) -> Result<ServiceMetadata, ReadError> {
    if !path.exists() {
        return Err(ReadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ReadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ServiceMetadata::primary(content))
}

/// Wrap a CSDL JSON string as service metadata.
pub fn load_metadata_str(content: &str) -> ServiceMetadata {
    ServiceMetadata::primary(content)
}

/// Load service metadata from an HTTP/HTTPS URL, typically a service's
/// `$metadata` endpoint.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ReadError::NetworkError` if the request fails or the server
/// answers with an error status.
#[cfg(feature = "remote")]
pub fn load_metadata_url(url: &str) -> Result<ServiceMetadata, ReadError> {
    let network_error = |source| ReadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(network_error)?;

    // Check for HTTP errors before reading the body
    let response = response.error_for_status().map_err(network_error)?;

    let content = response.text().map_err(network_error)?;
    tracing::debug!(url, bytes = content.len(), "fetched service metadata");
    Ok(ServiceMetadata::primary(content))
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load service metadata from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_metadata_auto(source: &str) -> Result<ServiceMetadata, ReadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_metadata_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ReadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_metadata(Path::new(source))
    }
}
