//! S6 (spec.md §8): binning a fixed-cadence raster to a coarser cadence
//! forces the first and last output fluxes to exactly 1.0, and produces one
//! point per cadence interval spanned by the source (spec.md §4.6.6).

mod common;

use eas_lib::lightcurve::LightCurveProduct;
use eas_lib::model::{ArtifactHandle, ArtifactSource, ConcreteTask, SynthesisSpecs, TaskList};
use std::collections::HashMap;
use std::io::Read;

fn source_handle() -> ArtifactHandle {
    ArtifactHandle {
        source: ArtifactSource::Memory,
        directory: "s6".to_string(),
        filename: "raster.lc".to_string(),
    }
}

fn binned_handle() -> ArtifactHandle {
    ArtifactHandle {
        source: ArtifactSource::Archive,
        directory: "s6".to_string(),
        filename: "binned.lc".to_string(),
    }
}

fn read_archived_raster(archive_root: &std::path::Path, handle: &ArtifactHandle) -> eas_lib::lightcurve::ArbitraryRaster {
    let path = archive_root.join(&handle.directory).join(&handle.filename);
    let gzipped = std::fs::read(&path).unwrap();
    let mut decoder = flate2::read::GzDecoder::new(&gzipped[..]);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).unwrap();
    match serde_json::from_slice::<LightCurveProduct>(&json).unwrap() {
        LightCurveProduct::ArbitraryRaster(raster) => raster,
        LightCurveProduct::FixedStep(_) => panic!("expected an arbitrary-raster product"),
    }
}

#[tokio::test]
async fn rebinning_forces_unity_edges_and_covers_the_source_span() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut runner, _results) = common::runner_with_recorder(tmp.path());

    // 25s cadence over 1 hour (144 points at 25s, spanning 3575s).
    let source = source_handle();
    let target = binned_handle();
    let list = TaskList {
        job_name: "s6".to_string(),
        job_parameters: HashMap::new(),
        clean_up: false,
        task_list: vec![
            ConcreteTask::PslsSynthesise {
                target: source.clone(),
                specs: SynthesisSpecs {
                    duration: 3_600.0 / 86_400.0,
                    planet_radius: 6_371e3,
                    orbital_period: 30.0,
                    semi_major_axis: 0.2,
                    orbital_angle: 0.0,
                    noise: Some(0.0),
                    sampling_cadence: Some(25.0),
                    enable_transits: false,
                    ..Default::default()
                },
            },
            ConcreteTask::Binning {
                source,
                target: target.clone(),
                cadence: 600.0,
            },
        ],
    };

    runner.run_task_list(list).await.unwrap();

    let rebinned = read_archived_raster(tmp.path(), &target);
    // Span is 143 * 25s = 3575s; a 600s-cadence walk from t=0 while
    // t < span lands on 0, 600, ..., 3000 -> 6 points.
    assert_eq!(rebinned.times.len(), 6);
    assert_eq!(*rebinned.fluxes.first().unwrap(), 1.0);
    assert_eq!(*rebinned.fluxes.last().unwrap(), 1.0);
}
