use reqwest::{Client, Request, StatusCode};
use serde_json::{Map, Value};
use crate::error::{Error, Result};

/// Untyped JSON object decoded from a single response body.
pub type RawQuote = Map<String, Value>;

/// Bodies quoted in decode errors are cut to this many characters.
const MAX_BODY_IN_ERROR: usize = 512;

/// Performs `request`, requires status 200 and decodes the body as a JSON object.
///
/// No retries: a single failure is terminal for the call.
pub async fn get_json(client: &Client, request: Request) -> Result<RawQuote> {
    let response = client.execute(request).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::UnexpectedStatus(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| Error::Body(e.to_string()))?;

    serde_json::from_slice::<RawQuote>(&body).map_err(|e| Error::Decode {
        body: String::from_utf8_lossy(&body).chars().take(MAX_BODY_IN_ERROR).collect(),
        reason: e.to_string(),
    })
}
