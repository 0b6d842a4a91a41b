//! Energy axis recalibration.

use approx::assert_relative_eq;
use xps_fit::config::DoubletShape;
use xps_fit::lm::LmConfig;
use xps_fit::model::fit;
use xps_fit::models::CompositeModel;
use xps_fit::parameters::{ComponentLabel, ParamKey, ParamKind};
use xps_fit::spectrum::Spectrum;
use xps_fit::{DoubletFitPipeline, PipelineConfig};

use crate::helpers::{init_logging, SyntheticExport};

fn centers(outcome: &xps_fit::FitOutcome, count: usize) -> Vec<f64> {
    ComponentLabel::sequence(count)
        .unwrap()
        .into_iter()
        .map(|label| outcome.value(ParamKey::main(label, ParamKind::Center)).unwrap())
        .collect()
}

#[test]
fn test_fit_is_shift_invariant() {
    init_logging();

    let table = SyntheticExport::new(&[128.8, 131.5], &[2500.0, 700.0])
        .with_noise(1.5, 3)
        .build();
    let guesses = [128.6, 131.7];
    let intensities = [2000.0, 600.0];
    let shape = DoubletShape::default();
    let config = LmConfig::default();

    let spectrum = Spectrum::from_table(&table).unwrap();
    let mut model = CompositeModel::build(&guesses, &intensities, &shape).unwrap();
    let original = fit(&mut model, &spectrum, &config).unwrap();

    for s in [-3.25, 0.7, 12.0] {
        let shifted = Spectrum::from_table(&table.shifted(s)).unwrap();
        let shifted_guesses: Vec<f64> = guesses.iter().map(|g| g + s).collect();
        let mut model = CompositeModel::build(&shifted_guesses, &intensities, &shape).unwrap();
        let moved = fit(&mut model, &shifted, &config).unwrap();

        assert!(moved.success, "{}", moved.message);
        for (c0, c1) in centers(&original, 2).iter().zip(centers(&moved, 2)) {
            assert_relative_eq!(c1 - s, *c0, epsilon = 1e-5);
        }
        assert_relative_eq!(moved.chisqr, original.chisqr, max_relative = 1e-6);
    }
}

#[test]
fn test_pipeline_result_does_not_depend_on_axis_offset() {
    let export = SyntheticExport::new(&[128.9, 131.4], &[2500.0, 700.0]);
    let table = export.build();
    let offset = 0.6;
    let offset_table = table.shifted(offset);

    let config = PipelineConfig::with_peaks(2).with_guesses(vec![128.7, 131.6], vec![1.0, 0.3]);
    let offset_config = config.clone().with_guesses(vec![129.3, 132.2], vec![1.0, 0.3]);

    let first = DoubletFitPipeline::new(config).run(&table).unwrap();
    let second = DoubletFitPipeline::new(offset_config).run(&offset_table).unwrap();

    assert_relative_eq!(first.shift - second.shift, offset, epsilon = 1e-4);
    for (c0, c1) in centers(&first.refined, 2).iter().zip(centers(&second.refined, 2)) {
        assert_relative_eq!(*c0, c1, epsilon = 1e-4);
    }
}

#[test]
fn test_reference_lands_on_configured_energy() {
    let table = SyntheticExport::new(&[126.3], &[1800.0]).build();
    let mut config = PipelineConfig::with_peaks(1).with_guesses(vec![126.0], vec![1.0]);
    config.reference_energy = 127.5;
    let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();

    assert_relative_eq!(outcome.shift, 1.2, epsilon = 1e-4);
    let a = ParamKey::main(ComponentLabel::REFERENCE, ParamKind::Center);
    assert_relative_eq!(outcome.refined.value(a).unwrap(), 127.5, epsilon = 1e-4);

    // The refined fit runs on the shifted grid
    assert_relative_eq!(
        outcome.refined.energies[0],
        outcome.coarse.energies[0] + outcome.shift,
        epsilon = 1e-12
    );
}
