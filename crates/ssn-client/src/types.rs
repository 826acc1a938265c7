//! Wire shapes of the endpoints this crate consumes.

use serde::Deserialize;

/// `GET /api/services` envelope. Records stay untyped until
/// [`crate::normalize`] maps them, so one malformed record cannot fail the
/// whole page.
#[derive(Debug, Deserialize)]
pub struct ServicesResponse {
    pub results: Vec<serde_json::Value>,
}

/// postcodes.io `GET /postcodes/{postcode}` envelope.
#[derive(Debug, Deserialize)]
pub struct PostcodeResponse {
    pub status: u16,
    #[serde(default)]
    pub result: Option<PostcodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct PostcodeResult {
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
