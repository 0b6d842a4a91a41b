//! Pipeline runs on synthetic spectra.

use approx::assert_relative_eq;
use xps_fit::config::DoubletShape;
use xps_fit::parameters::{ComponentLabel, ParamKey, ParamKind};
use xps_fit::{DoubletFitPipeline, PipelineConfig};

use crate::helpers::{init_logging, SyntheticExport};

fn label(c: char) -> ComponentLabel {
    ComponentLabel::try_from(c).unwrap()
}

#[test]
fn test_single_peak_far_from_guess() {
    init_logging();

    let table = SyntheticExport::new(&[130.0], &[5000.0])
        .with_noise(2.0, 7)
        .build();

    let config = PipelineConfig::with_peaks(1).with_guesses(vec![120.0], vec![1.0]);
    assert_eq!(config.shape, DoubletShape::default());
    let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();

    let a = ComponentLabel::REFERENCE;
    let coarse_center = outcome.coarse.value(ParamKey::main(a, ParamKind::Center)).unwrap();
    assert!((coarse_center - 130.0).abs() < 0.5, "coarse center {}", coarse_center);

    let refined_center = outcome.refined.value(ParamKey::main(a, ParamKind::Center)).unwrap();
    assert!((refined_center - 130.0).abs() < 0.5, "refined center {}", refined_center);
    assert!(outcome.shift.abs() < 0.5);

    assert_eq!(outcome.report.formatted_fractions()[&a], "100.00%");
    assert_eq!(outcome.report.distances[&a], 0.0);
    assert!(outcome.report.formatted_distances().is_empty());
}

#[test]
fn test_three_components() {
    init_logging();

    let table = SyntheticExport::new(&[128.8, 131.2, 132.5], &[3000.0, 900.0, 600.0])
        .with_noise(1.0, 11)
        .build();
    let config =
        PipelineConfig::with_peaks(3).with_guesses(vec![128.6, 131.0, 132.7], vec![1.0, 0.3, 0.2]);
    let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();

    assert!(outcome.refined.success);
    assert_relative_eq!(outcome.shift, 1.2, epsilon = 0.02);

    let report = &outcome.report;
    assert_relative_eq!(report.fractions.values().sum::<f64>(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(report.fractions[&label('a')], 3000.0 / 4500.0, epsilon = 0.02);
    assert_relative_eq!(report.fractions[&label('b')], 900.0 / 4500.0, epsilon = 0.02);
    assert_relative_eq!(report.fractions[&label('c')], 600.0 / 4500.0, epsilon = 0.02);

    assert_eq!(report.distances[&ComponentLabel::REFERENCE], 0.0);
    assert_relative_eq!(report.distances[&label('b')], 2.4, epsilon = 0.02);
    assert_relative_eq!(report.distances[&label('c')], 3.7, epsilon = 0.02);

    let distances = report.formatted_distances();
    assert_eq!(distances["ab_dist"], "2.40 eV");
    assert_eq!(distances["ac_dist"], "3.70 eV");
}

#[test]
fn test_refined_fit_frees_reference_widths() {
    let table = SyntheticExport::new(&[129.5, 132.0], &[2000.0, 800.0]).build();
    let config = PipelineConfig::with_peaks(2).with_guesses(vec![129.3, 132.2], vec![1.0, 0.4]);
    let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();

    let a = ComponentLabel::REFERENCE;
    let params = &outcome.refined.params;
    let sigma = params.get(ParamKey::main(a, ParamKind::Sigma)).unwrap();
    assert!(sigma.is_free());
    assert!(params.get(ParamKey::main(label('b'), ParamKind::Gamma)).unwrap().is_derived());

    // Data was generated with the default widths
    assert_relative_eq!(sigma.value(), 0.35, epsilon = 1e-3);
    assert_relative_eq!(
        params.value(ParamKey::main(a, ParamKind::Gamma)).unwrap(),
        0.15,
        epsilon = 1e-3
    );

    // Coarse and recalibrated stages keep the widths fixed
    assert_eq!(outcome.coarse.nvarys, 4);
    assert_eq!(outcome.recalibrated.as_ref().unwrap().nvarys, 4);
    assert_eq!(outcome.refined.nvarys, 6);
    assert_eq!(outcome.refined.var_names.len(), 6);
    assert!(outcome.refined.covariance.is_some());
    assert!(sigma.stderr.is_some());
}

#[test]
fn test_fixed_center_is_held() {
    let table = SyntheticExport::new(&[128.8, 131.2], &[3000.0, 900.0]).build();
    let b = label('b');
    let config = PipelineConfig::with_peaks(2)
        .with_guesses(vec![128.6, 131.0], vec![1.0, 0.3])
        .with_fixed_center(b, 132.3);
    let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();

    let center = outcome.refined.params.get(ParamKey::main(b, ParamKind::Center)).unwrap();
    assert!(center.is_fixed());
    assert_eq!(center.value(), 132.3);
    assert_relative_eq!(
        outcome.refined.value(ParamKey::satellite(b, ParamKind::Center)).unwrap(),
        133.14,
        epsilon = 1e-9
    );
    assert_relative_eq!(outcome.report.distances[&b], 132.3 - 130.0, epsilon = 0.02);
}

#[test]
fn test_without_recalibrated_prefit() {
    let table = SyntheticExport::new(&[129.0], &[1500.0]).build();
    let mut config = PipelineConfig::with_peaks(1).with_guesses(vec![128.8], vec![1.0]);
    config.prefit_recalibrated = false;
    let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();

    assert!(outcome.recalibrated.is_none());
    assert_relative_eq!(outcome.shift, 1.0, epsilon = 1e-4);
    assert_relative_eq!(
        outcome
            .refined
            .value(ParamKey::main(ComponentLabel::REFERENCE, ParamKind::Center))
            .unwrap(),
        130.0,
        epsilon = 1e-4
    );
}
