use super::common::Fixture;
use hashkeeper::reconcile::{check, generate};

#[test]
fn test_check_after_generate_is_clean() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"alpha");
    fixture.write("sub/b.txt", b"beta");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), true, false, 1).unwrap();

    let report = check(&mut ctx, &fixture.root()).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.ok, 2);
}

#[test]
fn test_check_reports_deleted_file_as_missing_and_keeps_record() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"alpha");
    fixture.write("b.txt", b"beta");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), false, false, 1).unwrap();
    ctx.shutdown(true).unwrap();

    fixture.remove("a.txt");
    let mut ctx = fixture.context();
    let report = check(&mut ctx, &fixture.root()).unwrap();
    ctx.shutdown(false).unwrap();

    assert_eq!(report.missing, vec![fixture.key("a.txt")]);
    assert_eq!(report.ok, 1);
    assert!(fixture.reopen().contains(&fixture.key("a.txt")).unwrap());
    assert!(fixture.sink.contains("File missing"));
}

#[test]
fn test_check_detects_single_byte_change() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"alpha");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), false, false, 1).unwrap();

    fixture.write("a.txt", b"alphb");
    let report = check(&mut ctx, &fixture.root()).unwrap();

    assert_eq!(report.mismatched, vec![fixture.key("a.txt")]);
    assert!(fixture.sink.contains("Hash mismatch for"));
}

#[test]
fn test_check_deleted_directory_root() {
    let fixture = Fixture::new();
    fixture.write("gone/a.txt", b"a");
    fixture.write("stay.txt", b"s");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), true, false, 1).unwrap();

    std::fs::remove_dir_all(fixture.path("gone")).unwrap();
    let report = check(&mut ctx, &fixture.path("gone")).unwrap();

    assert_eq!(report.missing, vec![fixture.key("gone/a.txt")]);
    assert_eq!(report.ok, 0);
}

#[test]
fn test_check_ignores_sibling_with_shared_prefix() {
    let fixture = Fixture::new();
    fixture.write("data/a.txt", b"a");
    fixture.write("database/b.txt", b"b");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), true, false, 1).unwrap();

    let report = check(&mut ctx, &fixture.path("data")).unwrap();

    assert_eq!(report.ok, 1);
}
