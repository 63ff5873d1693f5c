//! Plot file writer and the path checks shared with the report writer.

use crate::utils::error::OutputError;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Save a rendered event plot
///
/// **Public** - used by the plot command
///
/// # Arguments
/// * `svg_content` - markup produced by `EventPlot::render_svg`
/// * `output_path` - destination file; missing parent directories are created
///
/// # Errors
/// * `OutputError::InvalidPath` - empty path, a directory, or an uncreatable parent
/// * `OutputError::WriteFailed` - the file could not be written
pub fn write_svg(svg_content: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    validate_path(output_path)?;

    if output_path.extension().is_some_and(|ext| ext != "svg") {
        warn!("Plot path {} does not end in .svg", output_path.display());
    }

    ensure_parent_dir(output_path)?;

    let mut writer = BufWriter::new(File::create(output_path)?);
    writer.write_all(svg_content.as_bytes())?;
    writer.flush()?;

    info!(
        "Saved plot to {} ({:.1} KB)",
        output_path.display(),
        svg_content.len() as f64 / 1024.0
    );

    Ok(())
}

/// Reject paths no writer can use
///
/// **Public** - shared by the plot and report writers
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("no output path given".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "{} is a directory",
            path.display()
        )));
    }

    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), OutputError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    if !parent.exists() {
        debug!("mkdir -p {}", parent.display());
        std::fs::create_dir_all(parent).map_err(|e| {
            OutputError::InvalidPath(format!("{}: {}", parent.display(), e))
        })?;
    }

    Ok(())
}

/// Size on disk, or 0 when the file cannot be inspected
pub(crate) fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map_or(0, |m| m.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const VALID_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <rect x="0" y="0" width="100" height="100" fill="red"/>
</svg>"#;

    #[test]
    fn test_write_svg() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_svg(VALID_SVG, path).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), VALID_SVG);
    }

    #[test]
    fn test_validate_path_empty() {
        assert!(validate_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/plot.svg");

        write_svg(VALID_SVG, &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
