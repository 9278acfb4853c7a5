use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use gcode_trajectory::config::Config;
use gcode_trajectory::gcode::GCodeError;
use gcode_trajectory::print_job::{ConversionJob, JobError};
use tempfile::tempdir;

#[test]
fn test_run_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("square.gcode");
    fs::write(&path, "; square\nG21\nG90\nG1 X10 F3000\nG1 Y10\nG1 X0\nG1 Y0\nM84\n").unwrap();

    let job = ConversionJob::new(Config::default());
    let report = job.run_file(&path).unwrap();
    assert_eq!(report.source, path.display().to_string());
    assert_eq!(report.lines_processed, 8);
    assert_eq!(report.trajectory.len(), 4 * 21);
    assert_eq!(report.tally.count("M84"), 1);
    let last = report.trajectory.samples().last().unwrap();
    assert!(last.x.abs() < 1e-9 && last.y.abs() < 1e-9);
}

#[test]
fn test_run_reader() {
    let job = ConversionJob::new(Config::default());
    let report = job.run_reader("memory", Cursor::new("G1 X10\nG4 P500\n")).unwrap();
    assert_eq!(report.trajectory.len(), 521);
    assert!(report.tally.is_empty());
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let job = ConversionJob::new(Config::default());
    let err = job.run_file(dir.path().join("nope.gcode")).unwrap_err();
    assert!(matches!(err, JobError::Io { .. }));
}

#[test]
fn test_malformed_program_fails() {
    let job = ConversionJob::new(Config::default());
    let err = job.run_lines("broken", ["G1 X1", "G1 Y1", "G1 Z=3"]).unwrap_err();
    match err {
        JobError::GCode { source_name, error } => {
            assert_eq!(source_name, "broken");
            assert!(matches!(error, GCodeError::MalformedWord { line: 3, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_oversized_dwell_fails_only_its_job() {
    let job = ConversionJob::new(Config::default());
    let err = job.run_lines("huge", ["G1 X1", "G4 P1e30"]).unwrap_err();
    assert!(matches!(err, JobError::GCode { error: GCodeError::SampleLimit { line: 2, .. }, .. }));
    // The same job keeps converting other programs.
    assert_eq!(job.run_lines("small", ["G4 P3"]).unwrap().trajectory.len(), 3);
}

#[test]
fn test_invalid_config_fails_before_reading() {
    let mut config = Config::default();
    config.motion.max_velocity = -1.0;
    let err = ConversionJob::new(config).run_lines("any", ["G1 X1"]).unwrap_err();
    assert!(matches!(err, JobError::GCode { error: GCodeError::Config(_), .. }));
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let job = Arc::new(ConversionJob::new(Config::default()));
    let relative = ["G91", "M83", "G1 X5 E1", "G1 X5 E1"];
    let absolute = ["G1 X5 E1", "G1 X5 E1"];

    let expected_relative = job.run_lines("relative", relative).unwrap();
    let expected_absolute = job.run_lines("absolute", absolute).unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let job_rel = Arc::clone(&job);
        tasks.spawn_blocking(move || job_rel.run_lines("relative", relative).unwrap());
        let job_abs = Arc::clone(&job);
        tasks.spawn_blocking(move || job_abs.run_lines("absolute", absolute).unwrap());
    }
    while let Some(report) = tasks.join_next().await {
        let report = report.unwrap();
        let expected = if report.source == "relative" { &expected_relative } else { &expected_absolute };
        assert_eq!(report.trajectory, expected.trajectory);
    }

    // Absolute mode: the second move has no travel.
    assert_eq!(expected_absolute.trajectory.len(), 21);
    assert_eq!(expected_relative.trajectory.samples().last().unwrap().e, 2.0);
}
