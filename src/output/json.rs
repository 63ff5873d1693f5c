//! JSON report output writer.
//!
//! Writes Report structs to JSON files with proper formatting.

use super::svg::{calculate_file_size, ensure_parent_dir, validate_path};
use crate::parser::schema::Report;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &Report, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_path(output_path)?;
    ensure_parent_dir(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a report to a pretty JSON string
pub fn report_to_string(report: &Report) -> Result<String, OutputError> {
    serde_json::to_string_pretty(report).map_err(OutputError::SerializationFailed)
}

/// Read a report from a JSON file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<Report, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: Report = serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} threads",
        report.version,
        report.results.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{ThreadReport, ThreadResults};
    use crate::assert::MetricValue;
    use crate::parser::schema::QuorumCheck;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn create_test_report() -> Report {
        let mut foo = ThreadReport::new("foo");
        foo.values.insert("runtime".to_string(), MetricValue::Number(1.5));
        foo.values.insert("first_cpu".to_string(), MetricValue::Cpu(2));

        let mut results = ThreadResults::new();
        results.insert(10, foo);

        Report {
            version: "1.0.0".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            trace: "trace.json".to_string(),
            execnames: vec!["foo".to_string()],
            results,
            checks: vec![QuorumCheck {
                param: "start_time".to_string(),
                operation: "assert_start_time".to_string(),
                rank: 1,
                passed: true,
            }],
        }
    }

    #[test]
    fn test_write_and_read_report() {
        let report = create_test_report();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_report(&report, path).unwrap();
        let loaded = read_report(path).unwrap();

        assert_eq!(loaded.version, report.version);
        assert_eq!(loaded.results, report.results);
        assert_eq!(loaded.checks, report.checks);
    }

    #[test]
    fn test_report_to_string_uses_pid_keys() {
        let text = report_to_string(&create_test_report()).unwrap();
        assert!(text.contains("\"10\": {"));
        assert!(text.contains("\"task_name\": \"foo\""));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/report.json");

        write_report(&create_test_report(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
