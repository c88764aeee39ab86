// tests/install_pipeline.rs

//! End-to-end tests for the install pipeline, driven against fake
//! collaborators and real zip containers on disk.

mod common;

use common::{FakeInstaller, FakePermissions, Fixture, Harness, TrackingFs, write_zip};
use splitinstall::{
    Capability, ContainerKind, Error, ErrorKind, InstallOutcome, InstallState, RejectionStatus,
    SourceRef,
};
use std::fs;
use std::sync::atomic::Ordering;

const GAME_MANIFEST: &[u8] =
    br#"{"package_name": "com.example.game", "version_name": "1.2.0", "name": "Example Game"}"#;

fn failed_stage(outcome: &InstallOutcome) -> InstallState {
    match outcome {
        InstallOutcome::Failed { stage, .. } => *stage,
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_single_apk_installs_without_extraction() {
    let fixture = Fixture::new();
    let apk = fixture.input("app.apk");
    fs::write(&apk, b"apk").unwrap();

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(apk.clone())));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.kind, Some(ContainerKind::SingleUnit));
    assert_eq!(report.units_installed, 1);
    assert_eq!(report.auxiliaries_discovered, 0);

    let calls = harness.install_calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].multiple);
    assert_eq!(calls[0].names, vec!["app.apk"]);
    assert!(!fixture.config.cache_dir.exists());
}

#[test]
fn test_manifest_archive_with_data_file() {
    let fixture = Fixture::new();
    let xapk = fixture.input("game.xapk");
    write_zip(
        &xapk,
        &[
            ("config.arm64.apk", b"config"),
            ("base.apk", b"base"),
            ("manifest.json", GAME_MANIFEST),
            ("main.obb", b"expansion"),
        ],
    );

    let mut harness = Harness::new(&fixture);

    let plan = harness.pipeline.inspect(&xapk).unwrap();
    let names: Vec<_> = plan
        .units
        .iter()
        .map(|u| u.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["base.apk", "config.arm64.apk"]);
    assert_eq!(plan.auxiliaries.len(), 1);
    assert_eq!(
        plan.auxiliaries[0].destination,
        fixture.data_root().join("com.example.game/main.obb")
    );
    drop(plan);
    assert!(fixture.leftover_working_dirs().is_empty());

    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk.clone())));
    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.kind, Some(ContainerKind::ManifestArchive));
    assert_eq!(report.package_identifier.as_deref(), Some("com.example.game"));
    assert_eq!(report.version_label.as_deref(), Some("1.2.0"));
    assert_eq!(report.label.as_deref(), Some("Example Game"));
    assert_eq!(report.units_installed, 2);
    assert_eq!(report.auxiliaries_placed, 1);
    assert!(report.placement_error().is_none());

    assert_eq!(
        fs::read(fixture.data_root().join("com.example.game/main.obb")).unwrap(),
        b"expansion"
    );

    let calls = harness.install_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].multiple);
    assert_eq!(calls[0].names, vec!["base.apk", "config.arm64.apk"]);
    assert!(calls[0].all_present);

    assert!(fixture.leftover_working_dirs().is_empty());
    assert_eq!(harness.pipeline.state(), InstallState::Done);
}

#[test]
fn test_data_file_dropped_without_identifier() {
    let fixture = Fixture::new();
    let xapk = fixture.input("anon.xapk");
    write_zip(
        &xapk,
        &[
            ("base.apk", b"base"),
            ("manifest.json", br#"{"version_name": "3.0"}"#),
            ("main.obb", b"expansion"),
        ],
    );

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.package_identifier, None);
    assert_eq!(report.auxiliaries_discovered, 1);
    assert_eq!(report.auxiliaries_dropped, 1);
    assert_eq!(report.auxiliaries_placed, 0);
    assert!(report.auxiliaries_placed < report.auxiliaries_discovered);
    assert!(!fixture.data_root().exists());
    assert_eq!(harness.install_calls().len(), 1);
}

#[test]
fn test_permission_denied_touches_nothing() {
    let fixture = Fixture::new();
    let mut harness = Harness::with(
        &fixture,
        FakePermissions {
            storage: true,
            install: false,
            ..Default::default()
        },
        FakeInstaller::default(),
        TrackingFs::default(),
    );

    let mut picked = false;
    let report = harness.pipeline.run(|| {
        picked = true;
        None
    });

    assert!(matches!(
        &report.outcome,
        InstallOutcome::Failed {
            stage: InstallState::PermissionPending,
            error: Error::PermissionDenied(Capability::Install),
        }
    ));
    assert_eq!(
        harness.pipeline.history(),
        &[
            InstallState::Idle,
            InstallState::PermissionPending,
            InstallState::Failed
        ]
    );
    assert!(!picked);
    assert_eq!(harness.fs.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.source.calls.load(Ordering::SeqCst), 0);
    assert!(harness.install_calls().is_empty());
    assert_eq!(*harness.permissions.requests.lock().unwrap(), vec!["install"]);
}

#[test]
fn test_cancelled_selection_returns_to_idle() {
    let fixture = Fixture::new();
    let mut harness = Harness::new(&fixture);

    let report = harness.pipeline.run(|| None);
    assert!(matches!(report.outcome, InstallOutcome::Cancelled));
    assert_eq!(harness.pipeline.state(), InstallState::Idle);
    assert_eq!(harness.source.calls.load(Ordering::SeqCst), 0);
    assert!(harness.install_calls().is_empty());
}

#[test]
fn test_nested_data_namespaced_by_directory() {
    let fixture = Fixture::new();
    let xapk = fixture.input("nested.xapk");
    write_zip(
        &xapk,
        &[
            ("base.apk", b"base"),
            ("manifest.json", GAME_MANIFEST),
            ("Android/obb/com.example.game/main.7.com.example.game.obb", b"main"),
            ("Android/obb/com.example.shared/patch.obb", b"patch"),
        ],
    );

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.auxiliaries_placed, 2);
    let root = fixture.data_root();
    assert_eq!(
        fs::read(root.join("com.example.game/main.7.com.example.game.obb")).unwrap(),
        b"main"
    );
    assert_eq!(fs::read(root.join("com.example.shared/patch.obb")).unwrap(), b"patch");
}

#[test]
fn test_colliding_data_files_place_once() {
    let fixture = Fixture::new();
    let xapk = fixture.input("collide.xapk");
    write_zip(
        &xapk,
        &[
            ("base.apk", b"base"),
            ("manifest.json", GAME_MANIFEST),
            ("main.obb", b"root copy"),
            ("Android/obb/com.example.game/main.obb", b"nested copy"),
        ],
    );

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.auxiliaries_discovered, 2);
    assert_eq!(report.auxiliaries_placed, 1);
    assert_eq!(report.auxiliaries_dropped, 1);
    assert_eq!(
        fs::read(fixture.data_root().join("com.example.game/main.obb")).unwrap(),
        b"root copy"
    );
}

#[test]
fn test_split_archive_orders_base_first_and_ignores_data() {
    let fixture = Fixture::new();
    let apks = fixture.input("bundle.apks");
    write_zip(
        &apks,
        &[
            ("a_split.apk", b"a"),
            ("com.example.base.apk", b"base"),
            ("z_split.apk", b"z"),
            ("main.obb", b"ignored"),
            ("Android/obb/com.example/patch.obb", b"ignored"),
        ],
    );

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(apks)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.kind, Some(ContainerKind::SplitArchive));
    assert_eq!(report.auxiliaries_discovered, 0);
    assert!(!fixture.data_root().exists());

    let calls = harness.install_calls();
    assert_eq!(
        calls[0].names,
        vec!["com.example.base.apk", "a_split.apk", "z_split.apk"]
    );
}

#[test]
fn test_apkm_is_a_split_archive() {
    let fixture = Fixture::new();
    let apkm = fixture.input("bundle.APKM");
    write_zip(&apkm, &[("base.apk", b"base"), ("split_en.apk", b"en")]);

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(apkm)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.kind, Some(ContainerKind::SplitArchive));
    assert_eq!(report.units_installed, 2);
}

#[test]
fn test_placement_failure_is_not_fatal() {
    let fixture = Fixture::new();
    let xapk = fixture.input("game.xapk");
    write_zip(
        &xapk,
        &[
            ("base.apk", b"base"),
            ("manifest.json", GAME_MANIFEST),
            ("main.obb", b"main"),
            ("patch.obb", b"patch"),
        ],
    );

    let mut harness = Harness::with(
        &fixture,
        FakePermissions::granted(),
        FakeInstaller::default(),
        TrackingFs {
            fail_copies_to: vec!["patch.obb".into()],
            ..Default::default()
        },
    );
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.auxiliaries_discovered, 2);
    assert_eq!(report.auxiliaries_placed, 1);
    assert_eq!(report.placement_failures.len(), 1);
    assert!(report.placement_failures[0].destination.ends_with("patch.obb"));
    assert_eq!(
        report.placement_error().map(|e| e.kind()),
        Some(ErrorKind::AuxiliaryPlacementPartialFailure)
    );
    assert_eq!(harness.install_calls().len(), 1);
    assert!(fixture.leftover_working_dirs().is_empty());
}

#[test]
fn test_platform_rejection_fails_and_cleans_up() {
    let fixture = Fixture::new();
    let xapk = fixture.input("game.xapk");
    write_zip(
        &xapk,
        &[("base.apk", b"base"), ("manifest.json", GAME_MANIFEST)],
    );

    let mut harness = Harness::with(
        &fixture,
        FakePermissions::granted(),
        FakeInstaller::rejecting(RejectionStatus::Storage),
        TrackingFs::default(),
    );
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    match &report.outcome {
        InstallOutcome::Failed {
            error: Error::PlatformInstallRejected(rejection),
            ..
        } => assert_eq!(rejection.status, RejectionStatus::Storage),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(harness.pipeline.state(), InstallState::Failed);
    assert_eq!(report.package_identifier.as_deref(), Some("com.example.game"));
    assert!(fixture.leftover_working_dirs().is_empty());
}

#[test]
fn test_container_without_units() {
    let fixture = Fixture::new();
    let xapk = fixture.input("empty.xapk");
    write_zip(
        &xapk,
        &[("manifest.json", GAME_MANIFEST), ("main.obb", b"data")],
    );

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert_eq!(
        report.outcome.error_kind(),
        Some(ErrorKind::NoInstallableUnitsFound)
    );
    assert_eq!(failed_stage(&report.outcome), InstallState::SourceAcquired);
    assert!(harness.install_calls().is_empty());
    assert!(!fixture.data_root().exists());
    assert!(fixture.leftover_working_dirs().is_empty());
}

#[test]
fn test_corrupt_manifest_aborts() {
    let fixture = Fixture::new();
    let xapk = fixture.input("bad.xapk");
    write_zip(
        &xapk,
        &[("base.apk", b"base"), ("manifest.json", b"{not json")],
    );

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::ManifestCorrupt));
    assert!(harness.install_calls().is_empty());
    assert!(fixture.leftover_working_dirs().is_empty());
}

#[test]
fn test_unsupported_format() {
    let fixture = Fixture::new();
    let file = fixture.input("bundle.zip");
    write_zip(&file, &[("base.apk", b"base")]);

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(file)));

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::UnsupportedFormat));
    assert_eq!(report.kind, None);
    assert!(!fixture.config.cache_dir.exists());
}

#[test]
fn test_corrupt_archive_is_extraction_error() {
    let fixture = Fixture::new();
    let xapk = fixture.input("truncated.xapk");
    fs::write(&xapk, b"PK\x03\x04 truncated").unwrap();

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::ExtractionError));
    assert!(fixture.leftover_working_dirs().is_empty());
}

#[test]
fn test_unreadable_source() {
    let fixture = Fixture::new();
    let mut harness = Harness::new(&fixture);

    let missing = fixture.input("missing.apk");
    let report = harness.pipeline.run(|| Some(SourceRef::Path(missing)));

    assert_eq!(report.outcome.error_kind(), Some(ErrorKind::SourceUnreadable));
    assert_eq!(failed_stage(&report.outcome), InstallState::PermissionPending);
}

#[test]
fn test_every_unit_and_data_file_accounted_for() {
    let fixture = Fixture::new();
    let xapk = fixture.input("big.xapk");
    let units = ["split_a.apk", "split_b.apk", "base.apk", "split_c.apk"];
    let data = ["main.1.obb", "patch.1.obb", "extra.obb"];

    let mut entries: Vec<(String, Vec<u8>)> = vec![("manifest.json".into(), GAME_MANIFEST.to_vec())];
    entries.extend(units.iter().map(|u| (u.to_string(), u.as_bytes().to_vec())));
    entries.extend(data.iter().map(|d| (d.to_string(), d.as_bytes().to_vec())));
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    write_zip(&xapk, &borrowed);

    let mut harness = Harness::new(&fixture);
    let report = harness.pipeline.run(|| Some(SourceRef::Path(xapk)));

    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(report.units_installed, units.len());
    assert_eq!(report.auxiliaries_placed, data.len());

    let calls = harness.install_calls();
    assert_eq!(calls[0].names.len(), units.len());
    assert_eq!(calls[0].names[0], "base.apk");
    for name in data {
        let placed = fixture.data_root().join("com.example.game").join(name);
        assert_eq!(fs::read(placed).unwrap(), name.as_bytes());
    }
}

#[test]
fn test_pipeline_reusable_after_failure() {
    let fixture = Fixture::new();
    let mut harness = Harness::new(&fixture);

    let report = harness
        .pipeline
        .run(|| Some(SourceRef::Path(fixture.input("nope.apk"))));
    assert!(!report.is_success());
    assert_eq!(harness.pipeline.state(), InstallState::Failed);

    let apk = fixture.input("ok.apk");
    fs::write(&apk, b"apk").unwrap();
    let report = harness.pipeline.run(|| Some(SourceRef::Path(apk)));
    assert!(report.is_success(), "{:?}", report.outcome);
    assert_eq!(harness.pipeline.history().first(), Some(&InstallState::Idle));
    assert_eq!(harness.pipeline.history().last(), Some(&InstallState::Done));
}
