use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cloudability::export::aggregate::aggregate;
use crate::cloudability::export::error::Result;
use crate::cloudability::export::io::excel_write;
use crate::cloudability::export::io::http::ReportSource;
use crate::cloudability::export::model::ProviderExport;
use crate::cloudability::export::normalize::normalize;
use crate::cloudability::export::registry::ViewRegistry;

/// Fetches one view's raw report, validating the provider and view against
/// the registry before any network call is made.
pub fn fetch_view(
    registry: &ViewRegistry,
    source: &dyn ReportSource,
    provider: &str,
    view: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Value> {
    let config = registry.config_for(provider, view)?;
    source.fetch(provider, view, config, start, end)
}

/// Runs the full export: every registry provider and view in enumeration
/// order, sequentially.
///
/// Per-view failures (configuration, transport, schema) are logged and
/// contained; the view contributes nothing and processing continues.
/// Providers without any non-empty view result are omitted. When no provider
/// produced data at all, no output file is written and the run still
/// succeeds. Workbook-write failures abort the export as a unit.
#[instrument(
    level = "info",
    skip_all,
    fields(start = %start, end = %end, output = %output.display())
)]
pub fn run_export(
    registry: &ViewRegistry,
    source: &dyn ReportSource,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
    batch_rows: usize,
) -> Result<()> {
    let mut export = ProviderExport::new();

    for provider in registry.providers() {
        let views = registry.views_for(provider)?;
        let mut tables = Vec::new();

        for (view, config) in views {
            let view = view.as_str();
            let raw = match fetch_view(registry, source, provider, view, start, end) {
                Ok(raw) => raw,
                Err(error) => {
                    warn!(provider, view, %error, "report fetch failed; view skipped");
                    continue;
                }
            };

            match normalize(&raw, provider, view, config.category()) {
                Ok(table) if table.is_empty() => {
                    debug!(provider, view, "view returned no rows");
                }
                Ok(table) => tables.push(table),
                Err(error) => {
                    warn!(provider, view, %error, "normalization failed; view skipped");
                }
            }
        }

        match aggregate(tables) {
            Some(table) => {
                info!(provider, rows = table.rows.len(), "provider table aggregated");
                export.insert(provider.to_string(), table);
            }
            None => {
                warn!(provider, "no usable view data; provider omitted from export");
            }
        }
    }

    if export.is_empty() {
        warn!("no provider produced data; no workbook written");
        return Ok(());
    }

    info!(providers = export.len(), "writing workbook");
    excel_write::write_report(output, &export, batch_rows)
}
