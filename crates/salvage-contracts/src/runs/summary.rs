use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::AnalysisResult;

/// Roll-up of one batch of pipeline invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub total_images: u64,
    pub failed_images: u64,
    pub categories: BTreeMap<String, u64>,
}

impl BatchSummary {
    pub fn from_results(
        run_id: impl Into<String>,
        started_at: impl Into<String>,
        results: &[AnalysisResult],
    ) -> Self {
        let mut categories = BTreeMap::new();
        for result in results {
            *categories
                .entry(result.category.as_str().to_string())
                .or_insert(0) += 1;
        }
        Self {
            run_id: run_id.into(),
            started_at: started_at.into(),
            finished_at: now_utc_iso(),
            total_images: results.len() as u64,
            failed_images: results.iter().filter(|result| result.is_error()).count() as u64,
            categories,
        }
    }
}

/// Writes a serialized [`AnalysisResult`] plus a `ts` field and any `extra` keys.
pub fn write_result(
    path: &Path,
    result: &AnalysisResult,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = match serde_json::to_value(result)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    write_json_payload(path, payload, extra)
}

pub fn write_summary(
    path: &Path,
    summary: &BatchSummary,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = match serde_json::to_value(summary)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    write_json_payload(path, payload, extra)
}

fn write_json_payload(
    path: &Path,
    mut payload: Map<String, Value>,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    if let Some(extra) = extra {
        for (key, value) in extra {
            payload.insert(key.clone(), value.clone());
        }
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&Value::Object(payload))?)?;
    Ok(())
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
