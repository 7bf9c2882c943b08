use super::common::{sha256_hex, Fixture};
use hashkeeper::output::Level;
use hashkeeper::reconcile::{execute, Operation, RunReport, RunRequest};
use std::time::Duration;

fn generate(fixture: &Fixture, recursive: bool, update: bool) -> hashkeeper::reconcile::GenerateReport {
    let mut ctx = fixture.context();
    let request = RunRequest::new(Operation::Generate, fixture.root())
        .with_recursive(recursive)
        .with_update(update);
    let report = match execute(&mut ctx, &request).unwrap() {
        RunReport::Generated(report) => report,
        other => panic!("unexpected report {:?}", other),
    };
    ctx.shutdown(true).unwrap();
    report
}

#[test]
fn test_generate_inserts_every_file_with_correct_digest() {
    let fixture = Fixture::new();
    let files = ["a.txt", "b.bin", "nested/c.txt", "nested/deeper/d.txt"];
    for (i, name) in files.iter().enumerate() {
        fixture.write(name, format!("content {}", i).as_bytes());
    }

    let report = generate(&fixture, true, false);

    assert_eq!(report.inserted, files.len());
    let store = fixture.reopen();
    assert_eq!(store.len().unwrap(), files.len());
    for name in files {
        let record = store.get(&fixture.key(name)).unwrap().unwrap();
        assert_eq!(record.content_hash, sha256_hex(&fixture.path(name)));
        assert_eq!(record.session_id, 1);
    }
}

#[test]
fn test_generate_twice_is_idempotent() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    fixture.write("b.txt", b"b");

    generate(&fixture, false, false);
    let before = fixture.reopen().query(&hashkeeper::store::PathFilter::for_root(&fixture.root())).unwrap();

    let second = generate(&fixture, false, false);
    let after = fixture.reopen().query(&hashkeeper::store::PathFilter::for_root(&fixture.root())).unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(before, after);
}

#[test]
fn test_update_touches_only_the_changed_file() {
    let fixture = Fixture::new();
    fixture.write("keep.txt", b"unchanged");
    fixture.write("edit.txt", b"original");
    generate(&fixture, false, false);
    let keep_before = fixture.reopen().get(&fixture.key("keep.txt")).unwrap().unwrap();
    let edit_before = fixture.reopen().get(&fixture.key("edit.txt")).unwrap().unwrap();

    fixture.write("edit.txt", b"0riginal");
    let report = generate(&fixture, false, true);

    assert_eq!(report.updated, 1);
    let store = fixture.reopen();
    let edit_after = store.get(&fixture.key("edit.txt")).unwrap().unwrap();
    assert_ne!(edit_after.content_hash, edit_before.content_hash);
    assert_eq!(edit_after.content_hash, sha256_hex(&fixture.path("edit.txt")));
    assert_eq!(store.get(&fixture.key("keep.txt")).unwrap().unwrap(), keep_before);
}

#[test]
fn test_change_without_update_is_ignored() {
    let fixture = Fixture::new();
    fixture.write("edit.txt", b"original");
    generate(&fixture, false, false);
    let before = fixture.reopen().get(&fixture.key("edit.txt")).unwrap().unwrap();

    fixture.write("edit.txt", b"modified");
    let report = generate(&fixture, false, false);

    assert_eq!(report.updated, 0);
    assert_eq!(fixture.reopen().get(&fixture.key("edit.txt")).unwrap().unwrap(), before);
}

#[test]
fn test_dry_run_update_reports_without_writing() {
    let fixture = Fixture::new();
    fixture.write("edit.txt", b"original");
    generate(&fixture, false, false);
    let before = fixture.reopen().get(&fixture.key("edit.txt")).unwrap().unwrap();
    fixture.write("edit.txt", b"modified");

    let mut ctx = fixture.context().with_dry_run(true);
    let request = RunRequest::new(Operation::Generate, fixture.root()).with_update(true);
    execute(&mut ctx, &request).unwrap();
    ctx.shutdown(true).unwrap();

    assert!(fixture.sink.contains("Update skipped"));
    assert_eq!(fixture.reopen().get(&fixture.key("edit.txt")).unwrap().unwrap(), before);
}

#[test]
fn test_periodic_checkpoint_persists_progress() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    fixture.write("b.txt", b"b");

    let mut ctx = fixture.context().with_checkpoint_interval(Duration::ZERO);
    execute(&mut ctx, &RunRequest::new(Operation::Generate, fixture.root())).unwrap();

    assert!(ctx.checkpoints() >= 1);
    assert!(!fixture.reopen().is_empty().unwrap());
    ctx.shutdown(false).unwrap();
}

#[test]
fn test_interrupted_generate_keeps_checkpointed_records() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    let handler = hashkeeper::signal::create_handler();
    let mut ctx = fixture.context().with_shutdown(handler.clone());

    handler.request_shutdown();
    let err = execute(&mut ctx, &RunRequest::new(Operation::Generate, fixture.root())).unwrap_err();
    assert!(matches!(err, hashkeeper::reconcile::RunError::Interrupted));
    ctx.shutdown(true).unwrap();

    assert!(fixture.reopen().is_empty().unwrap());
}

#[test]
fn test_generate_on_invalid_root_fails() {
    let fixture = Fixture::new();
    let mut ctx = fixture.context();
    let request = RunRequest::new(Operation::Generate, fixture.path("does-not-exist"));

    let err = execute(&mut ctx, &request).unwrap_err();
    assert!(matches!(err, hashkeeper::reconcile::RunError::Scan(_)));
}

#[test]
fn test_folder_notices_emitted_once_per_directory() {
    let fixture = Fixture::new();
    fixture.write("one/a.txt", b"a");
    fixture.write("one/b.txt", b"b");
    fixture.write("two/c.txt", b"c");

    generate(&fixture, true, false);

    let folders: Vec<String> = fixture
        .sink
        .at(Level::Notice)
        .into_iter()
        .filter(|m| m.starts_with("Processing folder"))
        .collect();
    assert_eq!(folders.len(), 2);
    assert_eq!(Level::Notice.console_threshold(), 0);
}
