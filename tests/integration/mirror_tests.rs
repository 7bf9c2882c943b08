use super::common::Fixture;
use filetime::FileTime;
use hashkeeper::actions::MirrorCopier;
use hashkeeper::reconcile::generate;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generate_mirrors_hashed_files_with_timestamps() {
    let fixture = Fixture::new();
    let source = fixture.write("sub/a.txt", b"mirror me");
    fixture.write("b.txt", b"and me");
    let mtime = FileTime::from_unix_time(1_500_000_000, 0);
    filetime::set_file_mtime(&source, mtime).unwrap();
    let backup = TempDir::new().unwrap();

    let copier = MirrorCopier::new(&fixture.root(), backup.path()).unwrap();
    let mut ctx = fixture.context().with_copier(Box::new(copier));
    let report = generate(&mut ctx, &fixture.root(), true, false, 1).unwrap();

    assert_eq!(report.inserted, 2);
    let copied = backup.path().join("sub").join("a.txt");
    assert_eq!(fs::read(&copied).unwrap(), b"mirror me");
    assert_eq!(fs::read(backup.path().join("b.txt")).unwrap(), b"and me");
    let metadata = fs::metadata(&copied).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&metadata), mtime);
}

#[test]
fn test_mirror_failure_does_not_stop_hashing() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"content");
    let blocker = TempDir::new().unwrap();
    let destination = blocker.path().join("not-a-dir");
    fs::write(&destination, b"plain file").unwrap();

    let copier = MirrorCopier::new(&fixture.root(), &destination).unwrap();
    let mut ctx = fixture.context().with_copier(Box::new(copier));
    let report = generate(&mut ctx, &fixture.root(), false, false, 1).unwrap();

    assert_eq!(report.inserted, 1);
    assert!(ctx.store().contains(&fixture.key("a.txt")).unwrap());
}

#[test]
fn test_dry_run_generate_copies_nothing() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"content");
    let backup = TempDir::new().unwrap();

    let copier = MirrorCopier::new(&fixture.root(), backup.path()).unwrap();
    let mut ctx = fixture
        .context()
        .with_copier(Box::new(copier))
        .with_dry_run(true);
    generate(&mut ctx, &fixture.root(), false, false, 1).unwrap();

    assert!(!backup.path().join("a.txt").exists());
}

#[test]
fn test_dry_run_update_copies_nothing() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"first");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), false, false, 1).unwrap();
    ctx.shutdown(true).unwrap();
    fixture.write("a.txt", b"second");
    let backup = TempDir::new().unwrap();

    let copier = MirrorCopier::new(&fixture.root(), backup.path()).unwrap();
    let mut ctx = fixture
        .context()
        .with_copier(Box::new(copier))
        .with_dry_run(true);
    let report = generate(&mut ctx, &fixture.root(), false, true, 1).unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(fs::read_dir(backup.path()).unwrap().count(), 0);
}
