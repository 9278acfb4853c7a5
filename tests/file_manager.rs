// Tests for trajectory CSV and sidecar output

use std::fs;

use gcode_trajectory::config::Config;
use gcode_trajectory::file_manager::{self, FileManager, OutputError};
use gcode_trajectory::motion::Diagnostics;
use gcode_trajectory::print_job::ConversionJob;
use tempfile::tempdir;

const PROGRAM: [&str; 4] = ["G21", "G1 X10", "M104 S200", "G4 P5"];

#[test]
fn test_csv_without_diagnostics() {
    let dir = tempdir().unwrap();
    let report = ConversionJob::new(Config::default()).run_lines("part.gcode", PROGRAM).unwrap();
    let path = dir.path().join("plain.csv");
    file_manager::write_trajectory_csv(&path, &report.trajectory, None).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + 26);
    assert_eq!(lines[0], "t(ms),x,y,z,e");
    assert_eq!(lines[1], "0.000,0.000,0.000,0.000,0.000");
    assert_eq!(lines[2], "1.000,0.320,0.000,0.000,0.000");
    assert_eq!(lines[26], "25.000,10.000,0.000,0.000,0.000");
}

#[test]
fn test_write_report_with_diagnostics() {
    let dir = tempdir().unwrap();
    let config = Config::default();
    let report = ConversionJob::new(config.clone()).run_lines("part.gcode", PROGRAM).unwrap();
    let diagnostics = report.diagnostics(&config);
    assert!(diagnostics.is_some());

    let out_dir = dir.path().join("nested").join("out");
    let manager = FileManager::new(&out_dir);
    let stem = file_manager::output_stem(&report.source, &config.motion);
    let files = manager.write_report(&stem, &report, &config, diagnostics.as_ref()).unwrap();

    assert_eq!(files.csv, out_dir.join("part-300mms_min-2000mms_max.csv"));
    assert_eq!(files.sidecar, out_dir.join("part-300mms_min-2000mms_max.txt"));
    assert_eq!(files.csv_size, fs::metadata(&files.csv).unwrap().len());

    let csv = fs::read_to_string(&files.csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("t(ms),x,y,z,e,xLRA,yLRA,xSRA,ySRA"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 26);
    assert!(rows.iter().all(|r| r.split(',').count() == 9));

    let sidecar = fs::read_to_string(&files.sidecar).unwrap();
    assert!(sidecar.contains(&format!("Main File: {}", files.csv.display())));
    assert!(sidecar.contains(&format!("Main File Size: {}", file_manager::human_size(files.csv_size))));
    assert!(sidecar.contains("2nd Order Cutoff Freq: 20Hz"));
    assert!(sidecar.contains("Corner Velocity: 300 mm/s"));
    assert!(sidecar.contains("Max Velocity: 2000 mm/s"));
    assert!(sidecar.contains("Acceleration: 40000 mm/s^2"));
    assert!(sidecar.contains("Total path points: 26"));
    assert!(sidecar.contains("Timestep: 1ms"));
    assert!(sidecar.contains("Total Time: 0.026s"));
    assert!(sidecar.contains("Not implemented:\n- M104: 1"));
}

#[test]
fn test_sidecar_without_smoothing() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.smoothing.enabled = false;
    let report = ConversionJob::new(config.clone()).run_lines("plain", ["G1 X1"]).unwrap();
    let diagnostics = report.diagnostics(&config);
    assert!(diagnostics.is_none());

    let files = FileManager::new(dir.path()).write_report("plain", &report, &config, None).unwrap();
    let sidecar = fs::read_to_string(&files.sidecar).unwrap();
    assert!(sidecar.contains("2nd Order Cutoff Freq: disabled"));
    assert!(!sidecar.contains("Not implemented"));
    let header = fs::read_to_string(&files.csv).unwrap().lines().next().map(str::to_string);
    assert_eq!(header.as_deref(), Some("t(ms),x,y,z,e"));
}

#[test]
fn test_mismatched_diagnostics_are_rejected() {
    let dir = tempdir().unwrap();
    let report = ConversionJob::new(Config::default()).run_lines("short", ["G1 X1"]).unwrap();
    let diagnostics = Diagnostics { x_lra: vec![0.0], y_lra: vec![0.0], x_sra: vec![0.0], y_sra: vec![0.0] };
    let err = file_manager::write_trajectory_csv(dir.path().join("bad.csv"), &report.trajectory, Some(&diagnostics))
        .unwrap_err();
    assert!(matches!(err, OutputError::LengthMismatch { got: 1, .. }));
}
