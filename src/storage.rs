//! Sweep data file writing.
//!
//! Sweep results are persisted as tab-delimited text: `#`-prefixed metadata
//! comment lines followed by a header record and one row per wavelength
//! point. Filenames carry a date prefix, the chip name, and the circuit
//! location, with dots replaced by commas so coordinates survive in a single
//! filename token.

use crate::error::{BenchError, BenchResult};
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Metadata written into a sweep file's comment header.
#[derive(Clone, Debug)]
pub struct SweepFileMeta {
    /// Chip name for the filename and header.
    pub chip_name: String,
    /// Sweep start wavelength in nm.
    pub wl_start_nm: f64,
    /// Sweep stop wavelength in nm.
    pub wl_stop_nm: f64,
    /// Laser power in dBm.
    pub power_dbm: f64,
    /// Circuit location (x, y) in stage units.
    pub location: (f64, f64),
}

/// Writer for tab-delimited `.wlsweep` files.
pub struct SweepWriter {
    output_dir: PathBuf,
}

impl SweepWriter {
    /// Create a writer targeting the given output directory. The directory
    /// is created on first write.
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write one sweep: a wavelength axis plus one column per data channel.
    ///
    /// All channel columns must have the same length as `wavelengths`.
    /// Returns the path of the written file.
    pub fn write(
        &self,
        meta: &SweepFileMeta,
        wavelengths: &[f64],
        channels: &[(u8, Vec<f64>)],
    ) -> BenchResult<PathBuf> {
        for (ch, column) in channels {
            if column.len() != wavelengths.len() {
                return Err(BenchError::Sweep(format!(
                    "channel {} has {} points but the wavelength axis has {}",
                    ch,
                    column.len(),
                    wavelengths.len()
                )));
            }
        }

        if !self.output_dir.exists() {
            std::fs::create_dir_all(&self.output_dir)?;
        }

        let now = Utc::now();
        let path = self.output_dir.join(file_name(meta, &now));
        let mut file = File::create(&path)?;

        writeln!(file, "# Test performed at {}", now.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(file, "# Chip: {}", meta.chip_name)?;
        writeln!(file, "# Location: x={} y={}", meta.location.0, meta.location.1)?;
        writeln!(file, "# WL start: {}nm", meta.wl_start_nm)?;
        writeln!(file, "# WL stop: {}nm", meta.wl_stop_nm)?;
        writeln!(file, "# Laser power: {}dBm", meta.power_dbm)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(file);

        let mut header = vec!["wavelength_nm".to_string()];
        header.extend(channels.iter().map(|(ch, _)| format!("ch{ch}")));
        writer
            .write_record(&header)
            .map_err(|e| BenchError::Sweep(format!("failed to write header: {e}")))?;

        for (i, wl) in wavelengths.iter().enumerate() {
            let mut record = vec![wl.to_string()];
            record.extend(channels.iter().map(|(_, column)| column[i].to_string()));
            writer
                .write_record(&record)
                .map_err(|e| BenchError::Sweep(format!("failed to write data row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| BenchError::Sweep(format!("failed to flush sweep file: {e}")))?;

        info!(path = %path.display(), points = wavelengths.len(), "sweep file written");
        Ok(path)
    }

    /// The directory this writer targets.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn file_name(meta: &SweepFileMeta, now: &chrono::DateTime<Utc>) -> String {
    let stem = format!(
        "{}_{}_locx_{}_locy_{}",
        now.format("%Y_%m_%d_%H_%M"),
        meta.chip_name,
        meta.location.0,
        meta.location.1
    );
    // Coordinates may carry decimal points; commas keep the filename a
    // single token with one extension dot.
    format!("{}.wlsweep", stem.replace('.', ","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SweepFileMeta {
        SweepFileMeta {
            chip_name: "mzi_a".to_string(),
            wl_start_nm: 1500.0,
            wl_stop_nm: 1600.0,
            power_dbm: 12.0,
            location: (1.25, -0.5),
        }
    }

    #[test]
    fn test_file_name_replaces_dots() {
        let name = file_name(&meta(), &Utc::now());
        assert!(name.ends_with(".wlsweep"));
        let stem = name.trim_end_matches(".wlsweep");
        assert!(!stem.contains('.'));
        assert!(stem.contains("locx_1,25"));
        assert!(stem.contains("locy_-0,5"));
        assert!(stem.contains("mzi_a"));
    }

    #[test]
    fn test_write_tab_delimited_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SweepWriter::new(dir.path());

        let path = writer
            .write(
                &meta(),
                &[1500.0, 1500.5, 1501.0],
                &[(2, vec![0.9, 0.5, 0.8]), (3, vec![0.1, 0.2, 0.3])],
            )
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert!(lines[0].starts_with("# Test performed at"));
        assert!(lines.iter().any(|l| l.starts_with("# WL start: 1500nm")));

        let header = lines
            .iter()
            .find(|l| !l.starts_with('#'))
            .expect("header row");
        assert_eq!(*header, "wavelength_nm\tch2\tch3");

        let first_data = lines[lines.iter().position(|l| *l == *header).unwrap() + 1];
        assert_eq!(first_data, "1500\t0.9\t0.1");
        assert_eq!(lines.len(), 6 + 1 + 3); // comments + header + rows
    }

    #[test]
    fn test_column_length_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SweepWriter::new(dir.path());
        let result = writer.write(&meta(), &[1500.0, 1501.0], &[(2, vec![0.9])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("runs").join("today");
        let writer = SweepWriter::new(&nested);
        writer.write(&meta(), &[1500.0], &[(2, vec![0.5])]).unwrap();
        assert!(nested.exists());
    }
}
