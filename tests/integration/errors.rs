//! Caller-visible failures of the pipeline.

use ndarray::Array1;
use xps_fit::lm::LmConfig;
use xps_fit::parameters::ComponentLabel;
use xps_fit::spectrum::RawTable;
use xps_fit::{DoubletFitPipeline, PipelineConfig, XpsFitError};

use crate::helpers::SyntheticExport;

#[test]
fn test_mismatched_guess_lengths() {
    let table = SyntheticExport::new(&[130.0], &[1000.0]).build();
    let config = PipelineConfig::with_peaks(3).with_guesses(vec![120.0, 123.0, 124.0], vec![1.0, 0.1]);

    match DoubletFitPipeline::new(config).run(&table) {
        Err(XpsFitError::InvalidInput(msg)) => assert!(msg.contains("same length")),
        other => panic!("Expected InvalidInput, got {:?}", other.map(|o| o.shift)),
    }
}

#[test]
fn test_component_count_out_of_range() {
    let table = SyntheticExport::new(&[130.0], &[1000.0]).build();
    let six = vec![130.0; 6];
    let config = PipelineConfig::default().with_guesses(six.clone(), six);
    assert!(matches!(
        DoubletFitPipeline::new(config).run(&table),
        Err(XpsFitError::InvalidInput(_))
    ));

    let none = PipelineConfig::default().with_guesses(vec![], vec![]);
    assert!(matches!(
        DoubletFitPipeline::new(none).run(&table),
        Err(XpsFitError::InvalidInput(_))
    ));
}

#[test]
fn test_fixed_center_for_missing_component() {
    let table = SyntheticExport::new(&[130.0], &[1000.0]).build();
    let c = ComponentLabel::try_from('c').unwrap();
    let config = PipelineConfig::with_peaks(2).with_fixed_center(c, 131.0);
    assert!(matches!(
        DoubletFitPipeline::new(config).run(&table),
        Err(XpsFitError::InvalidInput(_))
    ));
}

#[test]
fn test_grid_mismatch() {
    let table = SyntheticExport::new(&[130.0], &[1000.0]).build();
    let mut window = table.window_energy().to_vec();
    let row = window.iter().position(Option::is_some).unwrap() + 10;
    window[row] = window[row].map(|e| e + 1e-6);
    let broken = RawTable::new(
        table.energy().clone(),
        table.counts().clone(),
        window,
        table.background().to_vec(),
    )
    .unwrap();

    let config = PipelineConfig::with_peaks(1).with_guesses(vec![130.0], vec![1.0]);
    assert!(matches!(
        DoubletFitPipeline::new(config).run(&broken),
        Err(XpsFitError::DataAlignment(_))
    ));
}

#[test]
fn test_empty_window() {
    let energy = Array1::linspace(135.0, 125.0, 11);
    let table = RawTable::new(
        energy.clone(),
        Array1::ones(11),
        vec![None; 11],
        vec![None; 11],
    )
    .unwrap();
    let config = PipelineConfig::with_peaks(1).with_guesses(vec![130.0], vec![1.0]);
    assert!(matches!(
        DoubletFitPipeline::new(config).run(&table),
        Err(XpsFitError::EmptyFitWindow)
    ));
}

#[test]
fn test_non_convergence_is_reported() {
    let table = SyntheticExport::new(&[130.0], &[1000.0]).build();
    let mut config = PipelineConfig::with_peaks(1).with_guesses(vec![129.0], vec![1.0]);
    config.lm = LmConfig {
        max_iterations: 1,
        ..LmConfig::default()
    };

    match DoubletFitPipeline::new(config).run(&table) {
        Err(XpsFitError::NonConvergence { stage, message }) => {
            assert_eq!(stage, "coarse");
            assert!(!message.is_empty());
        }
        other => panic!("Expected NonConvergence, got {:?}", other.map(|o| o.shift)),
    }
}

#[test]
fn test_flat_spectrum_is_degenerate() {
    // Counts equal the background everywhere, so the best fit has no area
    let export = SyntheticExport::new(&[130.0], &[0.0]);
    let table = export.build();
    let config = PipelineConfig::with_peaks(1).with_guesses(vec![130.0], vec![1.0]);

    let result = DoubletFitPipeline::new(config).run(&table);
    assert!(
        matches!(result, Err(XpsFitError::DegenerateResult(_))),
        "unexpected result {:?}",
        result.map(|o| o.report)
    );
}
