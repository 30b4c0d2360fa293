//! One-shot load of the O2D sheet.
//!
//! credentials → fetch → normalize, run once before the server starts. The
//! result is an immutable snapshot; nothing here runs again for the life of
//! the process.

use crate::config::Config;
use crate::error::StartupError;
use crate::google_api::{self, sheets};
use crate::table::{self, SalesTable};

/// Authenticate, fetch the configured range and normalize it.
///
/// Auth and normalize failures are fatal. A failed fetch is logged and
/// yields an empty table so the dashboard still comes up.
pub async fn load_snapshot(config: &Config) -> Result<SalesTable, StartupError> {
    let client = reqwest::Client::new();

    let token =
        google_api::ensure_credentials(&client, &config.credentials_path, &config.token_path)
            .await?;

    let rows = match sheets::fetch_values(
        &client,
        &config.sheets_base_url,
        &token.token,
        &config.spreadsheet_id,
        &config.range,
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Failed to fetch '{}': {}", config.range, e);
            Vec::new()
        }
    };

    if rows.is_empty() {
        log::warn!("No data found.");
    }

    let table = table::normalize(&rows, config.date_format)?;
    log::info!(
        "Loaded {} O2D records ({} sheet rows)",
        table.len(),
        rows.len().saturating_sub(1)
    );
    Ok(table)
}
