//! UK postcode validation and lookup against a postcodes.io-compatible API.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use ssn_core::Coordinates;

use crate::error::PostcodeError;
use crate::types::PostcodeResponse;

/// Outward code, then a digit and two letters for the inward code.
static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]?[0-9][A-Z]{2}$").expect("valid postcode regex")
});

/// Validates `input` and returns it in canonical form (`"M1 1AA"`).
///
/// Case-insensitive; whitespace anywhere in the input is ignored.
///
/// # Errors
///
/// Returns [`PostcodeError::Invalid`] with the trimmed input when it is not
/// a UK postcode.
pub fn normalize_postcode(input: &str) -> Result<String, PostcodeError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if !POSTCODE_RE.is_match(&compact) {
        return Err(PostcodeError::Invalid(input.trim().to_owned()));
    }
    let (outward, inward) = compact.split_at(compact.len() - 3);
    Ok(format!("{outward} {inward}"))
}

/// HTTP client resolving postcodes to coordinates.
#[derive(Debug, Clone)]
pub struct PostcodeLookup {
    client: Client,
    endpoint: Url,
}

impl PostcodeLookup {
    /// # Errors
    ///
    /// Returns [`PostcodeError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute URL, or [`PostcodeError::Http`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PostcodeError> {
        let endpoint = Url::parse(&format!("{}/postcodes/", base_url.trim_end_matches('/')))
            .map_err(|e| PostcodeError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// Validates and resolves `input`, returning the canonical postcode and
    /// its coordinates. Invalid input never reaches the network.
    ///
    /// # Errors
    ///
    /// - [`PostcodeError::Invalid`]: input is not a UK postcode.
    /// - [`PostcodeError::NotFound`]: HTTP 404 or a response without coordinates.
    /// - [`PostcodeError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`PostcodeError::Http`]: network or TLS failure.
    /// - [`PostcodeError::Deserialize`]: body is not the expected JSON.
    pub async fn lookup(&self, input: &str) -> Result<(String, Coordinates), PostcodeError> {
        let postcode = normalize_postcode(input)?;
        let url = self
            .endpoint
            .join(&postcode)
            .map_err(|e| PostcodeError::InvalidBaseUrl {
                url: self.endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PostcodeError::NotFound(postcode));
        }
        if !status.is_success() {
            return Err(PostcodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<PostcodeResponse>(&body).map_err(|e| {
            PostcodeError::Deserialize {
                context: format!("postcode lookup for {postcode}"),
                source: e,
            }
        })?;

        let coordinates = parsed
            .result
            .and_then(|r| r.latitude.zip(r.longitude))
            .map(|(lat, lng)| Coordinates { lat, lng })
            .ok_or_else(|| PostcodeError::NotFound(postcode.clone()))?;
        tracing::debug!(postcode = %postcode, "postcode resolved");
        Ok((postcode, coordinates))
    }
}
