//! End-to-end wavelength-sweep test over the mock laser and scope.

use picbench::config::{StorageSettings, SweepSettings};
use picbench::experiment::{
    CircuitLocation, Experiment, ExperimentRunner, WavelengthSweepExperiment,
};
use picbench::instrument::{MockLaser, MockScope};
use std::fs;
use tempfile::tempdir;

fn sweep_settings() -> SweepSettings {
    // 1500-1520 nm over 10 s is 2 nm/s; a 1 nm trigger step gives 21
    // wavelength points.
    SweepSettings {
        wl_start_nm: 1500.0,
        wl_stop_nm: 1520.0,
        duration_secs: 10.0,
        sample_rate: 2000.0,
        trigger_step_nm: 1.0,
        power_dbm: 6.0,
        buffer_secs: 1.0,
        active_channels: vec![1, 2],
        trigger_channel: 1,
        trigger_level_volts: 1.0,
    }
}

#[tokio::test]
async fn sweep_writes_a_tab_delimited_wlsweep_file() {
    let dir = tempdir().unwrap();
    let storage = StorageSettings {
        output_dir: dir.path().to_path_buf(),
        chip_name: "testchip".to_string(),
    };

    let laser = MockLaser::new();
    let scope = MockScope::new(laser.trigger_pulse_handle());
    let mut experiment = WavelengthSweepExperiment::new(laser, scope, sweep_settings(), &storage);

    let runner = ExperimentRunner::new(vec![CircuitLocation::new("mzi_1", 1.25, -0.5)]);
    runner.run_all(&mut experiment).await.unwrap();

    let path = experiment.last_output().expect("sweep file path").clone();
    assert!(path.exists());

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with(".wlsweep"));
    assert!(name.contains("testchip"));
    // Coordinate decimal points become commas in the filename.
    assert!(name.contains("locx_1,25"));
    assert!(name.contains("locy_-0,5"));

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    let comments: Vec<&&str> = lines.iter().filter(|l| l.starts_with('#')).collect();
    assert_eq!(comments.len(), 6);
    assert!(contents.contains("# Chip: testchip"));
    assert!(contents.contains("# Location: x=1.25 y=-0.5"));
    assert!(contents.contains("# WL start: 1500nm"));
    assert!(contents.contains("# WL stop: 1520nm"));
    assert!(contents.contains("# Laser power: 6dBm"));

    let header = lines[6];
    assert_eq!(header, "wavelength_nm\tch2");

    let data_rows = &lines[7..];
    assert_eq!(data_rows.len(), 21);

    let first: Vec<&str> = data_rows[0].split('\t').collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].parse::<f64>().unwrap(), 1500.0);
    let last: Vec<&str> = data_rows[20].split('\t').collect();
    assert_eq!(last[0].parse::<f64>().unwrap(), 1520.0);

    // Notch response stays within the synthesized transmission range.
    for row in data_rows {
        let v: f64 = row.split('\t').nth(1).unwrap().parse().unwrap();
        assert!((0.0..=1.0).contains(&v), "transmission out of range: {v}");
    }
}

#[tokio::test]
async fn sweep_runs_once_per_location() {
    let dir = tempdir().unwrap();
    let storage = StorageSettings {
        output_dir: dir.path().to_path_buf(),
        chip_name: "grid".to_string(),
    };

    let laser = MockLaser::new();
    let scope = MockScope::new(laser.trigger_pulse_handle());
    let mut experiment = WavelengthSweepExperiment::new(laser, scope, sweep_settings(), &storage);

    let runner = ExperimentRunner::new(vec![
        CircuitLocation::new("a", 0.0, 0.0),
        CircuitLocation::new("b", 2.5, 0.0),
    ]);
    runner.run_all(&mut experiment).await.unwrap();

    // Same minute, different locations: the coordinate suffix keeps the
    // filenames distinct.
    let files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.ends_with(".wlsweep")));
}

#[tokio::test]
async fn out_of_range_sweep_fails_setup() {
    let dir = tempdir().unwrap();
    let storage = StorageSettings {
        output_dir: dir.path().to_path_buf(),
        chip_name: "chip".to_string(),
    };

    let mut settings = sweep_settings();
    // Below the laser's 1500 nm minimum.
    settings.wl_start_nm = 1400.0;
    settings.wl_stop_nm = 1420.0;

    let laser = MockLaser::new();
    let scope = MockScope::new(laser.trigger_pulse_handle());
    let mut experiment = WavelengthSweepExperiment::new(laser, scope, settings, &storage);

    let err = experiment.setup().await.unwrap_err();
    assert!(err.to_string().contains("below laser minimum"));
}

#[tokio::test]
async fn too_fast_sweep_is_rejected() {
    let dir = tempdir().unwrap();
    let storage = StorageSettings {
        output_dir: dir.path().to_path_buf(),
        chip_name: "chip".to_string(),
    };

    let mut settings = sweep_settings();
    // 120 nm in one second exceeds the supported sweep rate.
    settings.wl_start_nm = 1500.0;
    settings.wl_stop_nm = 1620.0;
    settings.duration_secs = 1.0;

    let laser = MockLaser::new();
    let scope = MockScope::new(laser.trigger_pulse_handle());
    let mut experiment = WavelengthSweepExperiment::new(laser, scope, settings, &storage);

    let err = experiment.setup().await.unwrap_err();
    assert!(err.to_string().contains("sweep rate"));
}
