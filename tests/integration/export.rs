//! Instrument exports on disk and batch runs.

use approx::assert_relative_eq;
use std::io::Write;
use xps_fit::parameters::{ComponentLabel, ParamKey, ParamKind};
use xps_fit::table::{parse_csv, read_csv};
use xps_fit::{DoubletFitPipeline, PipelineConfig, XpsFitError};

use crate::helpers::{init_logging, render_export, SyntheticExport};

#[test]
fn test_export_round_trip() {
    let table = SyntheticExport::new(&[129.4], &[1200.0]).with_noise(1.0, 5).build();
    let text = render_export(&table, 7);

    let parsed = parse_csv(text.as_bytes(), 7).unwrap();
    assert_eq!(parsed.energy(), table.energy());
    assert_eq!(parsed.counts(), table.counts());
    assert_eq!(parsed.window_energy(), table.window_energy());
    assert_eq!(parsed.background(), table.background());
    assert!(parsed.envelope().iter().all(Option::is_none));
    assert!(parsed.peaks().is_empty());
}

#[test]
fn test_run_file() {
    init_logging();

    let table = SyntheticExport::new(&[129.4], &[1200.0]).build();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(render_export(&table, 7).as_bytes()).unwrap();

    let config = PipelineConfig::with_peaks(1).with_guesses(vec![129.0], vec![1.0]);
    let pipeline = DoubletFitPipeline::new(config);
    let from_file = pipeline.run_file(file.path()).unwrap();
    let in_memory = pipeline.run(&read_csv(file.path(), 7).unwrap()).unwrap();

    assert_relative_eq!(from_file.shift, 0.6, epsilon = 1e-4);
    assert_relative_eq!(from_file.shift, in_memory.shift, epsilon = 1e-12);
}

#[test]
fn test_missing_file() {
    let pipeline = DoubletFitPipeline::new(PipelineConfig::with_peaks(1));
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        pipeline.run_file(dir.path().join("missing.csv")),
        Err(XpsFitError::Io(_))
    ));
}

#[test]
fn test_fit_batch_keeps_order_and_isolates_failures() {
    init_logging();

    let good = |center: f64| SyntheticExport::new(&[center], &[1500.0]).build();
    let empty = {
        let table = good(129.0);
        xps_fit::RawTable::new(
            table.energy().clone(),
            table.counts().clone(),
            vec![None; table.energy().len()],
            vec![None; table.energy().len()],
        )
        .unwrap()
    };
    let tables = vec![good(129.0), empty, good(129.5), good(128.7)];

    let config = PipelineConfig::with_peaks(1).with_guesses(vec![129.0], vec![1.0]);
    let results = DoubletFitPipeline::new(config).fit_batch(&tables);

    assert_eq!(results.len(), 4);
    assert!(matches!(results[1], Err(XpsFitError::EmptyFitWindow)));
    for (result, expected_shift) in [(&results[0], 1.0), (&results[2], 0.5), (&results[3], 1.3)] {
        let outcome = result.as_ref().unwrap();
        assert_relative_eq!(outcome.shift, expected_shift, epsilon = 1e-4);
        assert_relative_eq!(
            outcome
                .refined
                .value(ParamKey::main(ComponentLabel::REFERENCE, ParamKind::Center))
                .unwrap(),
            130.0,
            epsilon = 1e-4
        );
    }
}
