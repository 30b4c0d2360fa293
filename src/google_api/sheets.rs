//! Google Sheets API v4 — `spreadsheets.values.get`.

use serde::Deserialize;

use super::GoogleApiError;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Fetch the 2-D grid of cells for `range`.
///
/// The API omits `values` entirely for an empty range, and trims trailing
/// empty cells from each row; both come back as-is (empty / short rows).
pub async fn fetch_values(
    client: &reqwest::Client,
    base_url: &str,
    access_token: &str,
    spreadsheet_id: &str,
    range: &str,
) -> Result<Vec<Vec<String>>, GoogleApiError> {
    let url = values_url(base_url, spreadsheet_id, range)?;

    let resp = client.get(url).bearer_auth(access_token).send().await?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleApiError::AuthExpired);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GoogleApiError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }

    let body: ValueRange = resp.json().await?;
    log::debug!(
        "Fetched {} rows from {}",
        body.values.len(),
        body.range.as_deref().unwrap_or(range)
    );

    Ok(body
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect())
}

/// `{base}/v4/spreadsheets/{id}/values/{range}` with each part path-encoded.
fn values_url(
    base_url: &str,
    spreadsheet_id: &str,
    range: &str,
) -> Result<reqwest::Url, GoogleApiError> {
    let mut url =
        reqwest::Url::parse(base_url).map_err(|e| GoogleApiError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| GoogleApiError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

// FORMATTED_VALUE rendering yields strings; anything else is stringified.
fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
