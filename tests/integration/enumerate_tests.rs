use super::common::Fixture;
use hashkeeper::reconcile::{execute, generate, DiffKind, Operation, Reconciler, RunReport, RunRequest};

fn enumerated(report: RunReport) -> Vec<String> {
    match report {
        RunReport::Enumerated { paths, .. } => paths,
        other => panic!("unexpected report {:?}", other),
    }
}

#[test]
fn test_new_and_missing_scenario() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), false, false, 1).unwrap();
    fixture.write("b.txt", b"b");

    let new = enumerated(execute(&mut ctx, &RunRequest::new(Operation::EnumerateNew, fixture.root())).unwrap());
    assert_eq!(new, vec![fixture.key("b.txt")]);

    let missing =
        enumerated(execute(&mut ctx, &RunRequest::new(Operation::EnumerateMissing, fixture.root())).unwrap());
    assert!(missing.is_empty());

    fixture.remove("a.txt");
    let missing =
        enumerated(execute(&mut ctx, &RunRequest::new(Operation::EnumerateMissing, fixture.root())).unwrap());
    assert_eq!(missing, vec![fixture.key("a.txt")]);
    assert!(fixture.sink.contains(&format!("File missing: {}", fixture.key("a.txt"))));
    assert!(fixture.sink.contains(&format!("New file: {}", fixture.key("b.txt"))));
}

#[test]
fn test_enumerate_new_respects_recursion() {
    let fixture = Fixture::new();
    fixture.write("top.txt", b"t");
    fixture.write("sub/nested.txt", b"n");
    let mut ctx = fixture.context();

    let flat = Reconciler::enumerate(&mut ctx, &fixture.root(), false, DiffKind::New).unwrap();
    assert_eq!(flat, vec![fixture.key("top.txt")]);

    let deep = Reconciler::enumerate(&mut ctx, &fixture.root(), true, DiffKind::New).unwrap();
    assert_eq!(deep.len(), 2);
}

#[test]
fn test_enumerate_missing_always_recursive() {
    let fixture = Fixture::new();
    fixture.write("sub/nested.txt", b"n");
    let mut ctx = fixture.context();
    generate(&mut ctx, &fixture.root(), true, false, 1).unwrap();

    let missing = Reconciler::enumerate(&mut ctx, &fixture.root(), false, DiffKind::Missing).unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_enumeration_is_sorted_and_read_only() {
    let fixture = Fixture::new();
    for name in ["c.txt", "a.txt", "b.txt"] {
        fixture.write(name, name.as_bytes());
    }
    let mut ctx = fixture.context();

    let new = Reconciler::enumerate(&mut ctx, &fixture.root(), false, DiffKind::New).unwrap();

    let mut sorted = new.clone();
    sorted.sort();
    assert_eq!(new, sorted);
    assert!(ctx.store().is_empty().unwrap());
}
