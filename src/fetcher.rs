use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, FETCH_ROW_LIMIT};
use crate::error::{AppError, Result};
use crate::types::RawPrizeRecord;

#[derive(Debug, Default)]
pub struct FetchStats {
    pub api_total: usize,
    /// Rows that were not JSON objects of the expected shape.
    pub rejected_shape: usize,
}

/// Download the full prize-tier dataset in one request.
///
/// Either the whole dataset comes back or the call fails; there is no retry
/// and no partial result. Individual rows with an unusable shape are skipped
/// and counted.
pub async fn fetch_records(cfg: &Config) -> Result<(Vec<RawPrizeRecord>, FetchStats)> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
        .build()?;

    info!("[FETCH] downloading dataset from {}", cfg.data_url);

    let resp: serde_json::Value = client
        .get(&cfg.data_url)
        .query(&[("$limit", FETCH_ROW_LIMIT)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let (records, stats) = parse_records(resp)?;
    info!(
        rows = stats.api_total,
        rejected = stats.rejected_shape,
        "[FETCH] retrieved {} rows",
        stats.api_total,
    );
    Ok((records, stats))
}

/// Split a JSON array response into raw records.
pub fn parse_records(resp: serde_json::Value) -> Result<(Vec<RawPrizeRecord>, FetchStats)> {
    let items = match resp {
        serde_json::Value::Array(a) => a,
        other => {
            return Err(AppError::Upstream(format!(
                "dataset response was not an array (got {})",
                json_kind(&other)
            )))
        }
    };

    let mut stats = FetchStats { api_total: items.len(), ..Default::default() };
    let mut records = Vec::with_capacity(items.len());

    for item in items {
        match serde_json::from_value::<RawPrizeRecord>(item) {
            Ok(r) => records.push(r),
            Err(e) => {
                stats.rejected_shape += 1;
                debug!("[FETCH] skipping malformed row: {e}");
            }
        }
    }

    Ok((records, stats))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
