//! The bundled worker driven through the external process backend.
//!
//! These tests spawn the `nvision` binary built for this package, so the
//! external and in-process paths run the same engine and must agree.

use std::sync::Arc;

use nvision_backend_process::{ExternalConfig, ExternalProcessBackend};
use nvision_cli::backends::{BackendSpec, Orchestrator, OrchestratorConfig, ProbeCache};
use nvision_engine::{detect, generate_sample, InProcessBackend, SampleProfile};
use nvision_spec::{
    BackendKind, BackendRequest, CancellationToken, DetectionBackend, DetectionParameters,
    ProbeStatus, ScanFrame,
};
use pretty_assertions::assert_eq;

fn worker_config(id: &str) -> ExternalConfig {
    ExternalConfig::bundled_worker(id)
        .program_path(env!("CARGO_BIN_EXE_nvision"))
        .env_var(None)
}

#[test]
fn worker_probe_is_available() {
    let backend = ExternalProcessBackend::new(worker_config("worker"));
    assert_eq!(backend.probe(), ProbeStatus::Available);
}

#[test]
fn worker_matches_in_process_engine() {
    let frame = generate_sample(SampleProfile::Demo, 3);
    let params = DetectionParameters::new(2.0, 5).with_smoothing_sigma(1.1);
    let cancel = CancellationToken::new();

    let backend = ExternalProcessBackend::new(worker_config("worker"));
    let request = BackendRequest::new(&frame, &params, "demo3", &cancel).render_image(true);
    let run = backend.run(&request).unwrap();

    let expected = detect(&frame, &params).unwrap();
    assert_eq!(run.result, expected);
    let png = run.image.unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn orchestrator_prefers_worker() {
    let frame = generate_sample(SampleProfile::Fallback, 42);
    let orch = Orchestrator::new(vec![
        Box::new(ExternalProcessBackend::new(worker_config("worker"))),
        Box::new(InProcessBackend::new()),
    ])
    .with_cache(Arc::new(ProbeCache::new()));

    let outcome = orch
        .run(&frame, &DetectionParameters::default(), &CancellationToken::new())
        .unwrap();
    assert_eq!(outcome.backend_id, "worker");
    assert_eq!(outcome.backend_kind, BackendKind::ExternalProcess);
    assert!(!outcome.degraded);
    assert_eq!(outcome.result.peak_count(), 3);
}

#[test]
fn missing_worker_degrades_to_in_process() {
    let frame = generate_sample(SampleProfile::Fallback, 42);
    let config = OrchestratorConfig::default().backends(vec![
        BackendSpec::External(
            ExternalConfig::new("worker", "nvision-no-such-program-xyz")
                .args(["worker"])
                .env_var(None),
        ),
        BackendSpec::in_process(),
        BackendSpec::synthetic(42, SampleProfile::Fallback),
    ]);
    let orch = Orchestrator::from_config(&config).with_cache(Arc::new(ProbeCache::new()));

    let outcome = orch
        .run(&frame, &DetectionParameters::default(), &CancellationToken::new())
        .unwrap();
    assert_eq!(outcome.backend_id, "in_process");
    assert!(outcome.degraded);
    assert!(!outcome.is_sample);
    assert_eq!(
        outcome.message(),
        "Analysis completed with in_process backend (preferred backend not installed)"
    );
}

#[test]
fn worker_rejects_malformed_scan() {
    let frame = ScanFrame::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0], vec![7.0, 8.0, 9.0]]);
    let params = DetectionParameters::default();
    let cancel = CancellationToken::new();

    let backend = ExternalProcessBackend::new(worker_config("worker"));
    let err = backend
        .run(&BackendRequest::new(&frame, &params, "ragged", &cancel))
        .unwrap_err();
    assert!(err.to_string().contains("ShapeError"), "{}", err);
}
