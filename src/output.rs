use anyhow::{Context, Result};
use biosim_common::{FrameRecord, MetricReading, OutputConfig, OutputFormat};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the recorded frames (and the metrics CSV) as configured.
pub fn save_recording(records: &[FrameRecord], output: &OutputConfig) -> Result<()> {
    if output.save_snapshots {
        let format = match output.output_format() {
            Some(format) => format,
            None => {
                warn!(
                    "Unknown output format: {}. Using JSON instead.",
                    output.format.as_deref().unwrap_or_default()
                );
                OutputFormat::Json
            }
        };
        let path = snapshot_path(&output.base_filename, format);
        write_snapshots(records, format, &path)?;
        info!("{} snapshots saved to {}", records.len(), path.display());
    } else {
        info!("Skipping snapshots as per config (save_snapshots is false).");
    }

    if output.save_metrics_csv {
        let path = PathBuf::from(format!("{}_metrics.csv", output.base_filename));
        write_metrics_csv(records, &path)?;
        info!("Metrics saved to {}", path.display());
    }
    Ok(())
}

pub fn snapshot_path(base_filename: &str, format: OutputFormat) -> PathBuf {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Bincode => "bin",
        OutputFormat::Messagepack => "msgpack",
    };
    PathBuf::from(format!("{}_snapshots.{}", base_filename, extension))
}

pub fn write_snapshots(records: &[FrameRecord], format: OutputFormat, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, records)
            .context("Error serializing snapshots to JSON")?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, records)
            .context("Error serializing snapshots to bincode")?,
        OutputFormat::Messagepack => rmp_serde::encode::write(&mut writer, records)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer
        .flush()
        .with_context(|| format!("Error writing snapshot file '{}'", path.display()))?;
    Ok(())
}

const CSV_HEADER: [&str; 15] = [
    "frame",
    "time_s",
    "growth_rate",
    "vascularization",
    "immune_infiltration",
    "oxygen_level",
    "integration_score",
    "active_pathways",
    "correlations",
    "survival_rate",
    "apoptosis_rate",
    "ic50",
    "efficacy",
    "live_molecules",
    "dead_cells",
];

/// One row per recorded frame with the exact (not eased) metric values.
pub fn write_metrics_csv(records: &[FrameRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(CSV_HEADER)?;

    let fmt = |m: &MetricReading| format!("{:.4}", m.value);
    for r in records {
        writer.write_record(&[
            r.frame.to_string(),
            format!("{:.4}", r.time_s),
            fmt(&r.tumor.growth_rate),
            fmt(&r.tumor.vascularization),
            fmt(&r.tumor.immune_infiltration),
            fmt(&r.tumor.oxygen_level),
            fmt(&r.omics.integration_score),
            r.omics.active_pathway_count().to_string(),
            r.omics.correlations.to_string(),
            fmt(&r.drug.survival_rate),
            fmt(&r.drug.apoptosis_rate),
            fmt(&r.drug.ic50),
            fmt(&r.drug.efficacy),
            r.live_molecules.to_string(),
            r.drug.census.dead.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
