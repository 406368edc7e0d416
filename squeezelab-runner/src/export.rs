//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for analysis results:
//! - **JSON**: the run manifest, with schema versioning
//! - **CSV**: outcome records, summary rows, and the indicator table
//! - **Markdown**: a human-readable report
//!
//! Undefined values are written as empty CSV cells and as `-` in Markdown.
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use squeezelab_core::{AnnotatedBar, OutcomeRecord, SummaryRow};

use crate::runner::{AnalysisResult, SCHEMA_VERSION};

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}%"))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `AnalysisResult` to pretty JSON.
pub fn export_json(result: &AnalysisResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize AnalysisResult to JSON")
}

/// Deserialize an `AnalysisResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<AnalysisResult> {
    let result: AnalysisResult =
        serde_json::from_str(json).context("failed to deserialize AnalysisResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per (region, hold period) outcome.
pub fn export_outcomes_csv(records: &[OutcomeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "squeeze_start_time",
        "squeeze_end_time",
        "breakout_time",
        "exit_time",
        "breakout_index",
        "exit_index",
        "direction",
        "hold_period",
        "pct_change",
        "max_up_pct",
        "max_down_pct",
        "squeeze_duration",
    ])?;

    for r in records {
        wtr.write_record([
            r.squeeze_start_time.to_rfc3339(),
            r.squeeze_end_time.to_rfc3339(),
            r.breakout_time.to_rfc3339(),
            r.exit_time.to_rfc3339(),
            r.breakout_index.to_string(),
            r.exit_index.to_string(),
            r.direction.to_string(),
            r.hold_period.to_string(),
            cell(r.pct_change),
            cell(r.max_up_pct),
            cell(r.max_down_pct),
            r.squeeze_duration.to_string(),
        ])?;
    }

    finish(wtr)
}

pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "hold_period",
        "direction",
        "count",
        "pct_change_mean",
        "pct_change_median",
        "pct_change_std",
        "pct_change_min",
        "pct_change_max",
        "max_up_pct_mean",
        "max_up_pct_max",
        "max_down_pct_mean",
        "max_down_pct_min",
    ])?;

    for r in rows {
        wtr.write_record([
            r.hold_period.to_string(),
            r.direction.to_string(),
            r.count.to_string(),
            cell(r.pct_change_mean),
            cell(r.pct_change_median),
            cell(r.pct_change_std),
            cell(r.pct_change_min),
            cell(r.pct_change_max),
            cell(r.max_up_pct_mean),
            cell(r.max_up_pct_max),
            cell(r.max_down_pct_mean),
            cell(r.max_down_pct_min),
        ])?;
    }

    finish(wtr)
}

/// The per-bar indicator table, for inspecting thresholds by eye.
pub fn export_annotated_csv(bars: &[AnnotatedBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "bb_mid",
        "bb_upper",
        "bb_lower",
        "bandwidth",
        "atr",
        "squeeze",
        "squeeze_start",
        "squeeze_end",
    ])?;

    for b in bars {
        let squeeze = match b.is_squeeze {
            Some(true) => "1",
            Some(false) => "0",
            None => "",
        };
        wtr.write_record([
            b.timestamp().to_rfc3339(),
            b.bar.open.to_string(),
            b.bar.high.to_string(),
            b.bar.low.to_string(),
            b.bar.close.to_string(),
            b.bar.volume.to_string(),
            cell(b.bands.map(|x| x.mid)),
            cell(b.bands.map(|x| x.upper)),
            cell(b.bands.map(|x| x.lower)),
            cell(b.bandwidth),
            cell(b.atr),
            squeeze.to_string(),
            u8::from(b.squeeze_start).to_string(),
            u8::from(b.squeeze_end).to_string(),
        ])?;
    }

    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one analysis run.
///
/// Creates a directory named `{symbol}_{interval}_{timestamp}/` under
/// `output_dir` containing:
/// - `manifest.json`: the full `AnalysisResult`
/// - `outcomes.csv`: one row per outcome record
/// - `summary.csv`: grouped statistics
/// - `report.md`: the Markdown report
///
/// With `include_bars`, the indicator table is written to `annotated.csv`.
/// Returns the path to the created directory.
pub fn save_artifacts(
    result: &AnalysisResult,
    output_dir: &Path,
    include_bars: bool,
) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        result.config.data.symbol,
        result.config.data.interval,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("outcomes.csv"),
        export_outcomes_csv(&result.outcomes)?,
    )?;
    std::fs::write(run_dir.join("summary.csv"), export_summary_csv(&result.summary)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;
    if include_bars {
        std::fs::write(
            run_dir.join("annotated.csv"),
            export_annotated_csv(&result.bars)?,
        )?;
    }

    Ok(run_dir)
}

/// Load an `AnalysisResult` from an artifact directory's manifest.json.
///
/// The indicator table is not part of the manifest and comes back empty.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Summary rows as a Markdown table.
pub fn summary_table(rows: &[SummaryRow]) -> String {
    let mut md = String::with_capacity(128 + rows.len() * 96);
    md.push_str("| Hold | Direction | Count | Mean | Median | Std | Min | Max ");
    md.push_str("| Max Up (mean) | Max Down (mean) |\n");
    md.push_str("| ---: | --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for r in rows {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            r.hold_period,
            r.direction,
            r.count,
            pct(r.pct_change_mean),
            pct(r.pct_change_median),
            pct(r.pct_change_std),
            pct(r.pct_change_min),
            pct(r.pct_change_max),
            pct(r.max_up_pct_mean),
            pct(r.max_down_pct_mean),
        ));
    }
    md
}

/// Generate a Markdown report for one analysis run.
pub fn generate_report(result: &AnalysisResult) -> String {
    let cfg = &result.config;
    let mut md = String::with_capacity(2048);

    md.push_str("# Squeeze Breakout Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Symbol | {} {} |\n",
        cfg.data.symbol, cfg.data.interval
    ));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        result.first_timestamp, result.last_timestamp
    ));
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    if result.dropped_bars > 0 {
        md.push_str(&format!("| Dropped Bars | {} |\n", result.dropped_bars));
    }
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Config Hash | {} |\n", result.config_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Parameters\n\n");
    md.push_str(&format!(
        "- Bollinger: {} bars, {}σ\n",
        cfg.indicators.bb_window, cfg.indicators.bb_std_multiplier
    ));
    md.push_str(&format!("- ATR: {} bars\n", cfg.indicators.atr_window));
    md.push_str(&format!(
        "- Quantiles: bandwidth {}, ATR {} ({})\n",
        cfg.squeeze.bandwidth_quantile,
        cfg.squeeze.atr_quantile,
        if cfg.squeeze.causal { "expanding" } else { "global" }
    ));
    let holds: Vec<String> = cfg
        .breakout
        .hold_periods
        .iter()
        .map(|h| h.to_string())
        .collect();
    md.push_str(&format!("- Hold periods: {}\n\n", holds.join(", ")));

    md.push_str("## Squeezes\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Bandwidth Threshold | {} |\n",
        result
            .thresholds
            .bandwidth
            .map_or_else(|| "-".to_string(), |v| format!("{v:.6}"))
    ));
    md.push_str(&format!(
        "| ATR Threshold | {} |\n",
        result
            .thresholds
            .atr
            .map_or_else(|| "-".to_string(), |v| format!("{v:.6}"))
    ));
    md.push_str(&format!("| Squeeze Bars | {} |\n", result.squeeze_bar_count));
    md.push_str(&format!(
        "| Squeeze Events | {} |\n",
        result.squeeze_event_count
    ));
    md.push_str(&format!("| Outcome Records | {} |\n", result.outcomes.len()));
    if let Some(open) = &result.open_region {
        md.push_str(&format!(
            "| Open Squeeze | since {} ({} bars) |\n",
            open.start_time.to_rfc3339(),
            open.duration
        ));
    }
    md.push('\n');

    md.push_str("## Outcomes\n\n");
    if result.summary.is_empty() {
        md.push_str("No completed breakout tests.\n");
    } else {
        md.push_str(&summary_table(&result.summary));
    }

    md
}
