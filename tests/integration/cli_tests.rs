use super::common::Fixture;
use clap::Parser;
use hashkeeper::cli::Cli;
use hashkeeper::config::Config;
use hashkeeper::error::ExitCode;
use hashkeeper::reconcile::RunReport;
use hashkeeper::signal::create_handler;

fn run(fixture: &Fixture, args: &[&str]) -> anyhow::Result<RunReport> {
    let db = fixture.db_path().to_string_lossy().to_string();
    let root = fixture.root().to_string_lossy().to_string();
    let argv = ["hashkeeper", "-d", db.as_str()]
        .into_iter()
        .chain(args.iter().copied())
        .chain(std::iter::once(root.as_str()));
    let cli = Cli::try_parse_from(argv)?;
    let invocation = cli.into_invocation(&Config::default())?;
    hashkeeper::run_invocation(invocation, create_handler())
}

#[test]
fn test_generate_then_check_through_cli() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    fixture.write("sub/b.txt", b"b");

    match run(&fixture, &["-g", "-r"]).unwrap() {
        RunReport::Generated(report) => assert_eq!(report.inserted, 2),
        other => panic!("unexpected report {:?}", other),
    }
    match run(&fixture, &["-c"]).unwrap() {
        RunReport::Checked(report) => assert!(report.is_clean()),
        other => panic!("unexpected report {:?}", other),
    }
}

#[test]
fn test_test_run_leaves_store_empty() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");

    run(&fixture, &["-g", "-t"]).unwrap();

    assert!(fixture.reopen().is_empty().unwrap());
}

#[test]
fn test_outfile_receives_outcomes() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    run(&fixture, &["-g"]).unwrap();
    fixture.remove("a.txt");
    let transcript = fixture.db_dir.path().join("out.txt");
    let outfile = transcript.to_string_lossy().to_string();

    run(&fixture, &["-m", "-o", outfile.as_str()]).unwrap();

    let written = std::fs::read_to_string(&transcript).unwrap();
    assert!(written.contains(&format!("File missing: {}", fixture.key("a.txt"))));
    assert!(!written.contains("Listing files"));
}

#[test]
fn test_argument_errors_map_to_exit_code_four() {
    let fixture = Fixture::new();
    let err = run(&fixture, &["-c", "-u"]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidArguments);

    let err = run(&fixture, &["-p", "--db-path", "/a", "--fs-path", "/b"]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidArguments);
}

#[test]
fn test_missing_root_maps_to_invalid_path() {
    let fixture = Fixture::new();
    let db = fixture.db_path().to_string_lossy().to_string();
    let root = fixture.path("nope").to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["hashkeeper", "-d", db.as_str(), "-g", root.as_str()]).unwrap();
    let invocation = cli.into_invocation(&Config::default()).unwrap();

    let err = hashkeeper::run_invocation(invocation, create_handler()).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidPath);
}

#[test]
fn test_corrupt_store_maps_to_invalid_database() {
    let fixture = Fixture::new();
    std::fs::write(fixture.db_path(), vec![0x5au8; 2048]).unwrap();

    let err = run(&fixture, &["-c"]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidDatabase);
}

#[test]
fn test_interrupt_maps_to_exit_130_and_saves_progress() {
    let fixture = Fixture::new();
    fixture.write("a.txt", b"a");
    let db = fixture.db_path().to_string_lossy().to_string();
    let root = fixture.root().to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["hashkeeper", "-d", db.as_str(), "-g", root.as_str()]).unwrap();
    let invocation = cli.into_invocation(&Config::default()).unwrap();
    let handler = create_handler();
    handler.request_shutdown();

    let err = hashkeeper::run_invocation(invocation, handler).unwrap_err();

    assert_eq!(ExitCode::from_error(&err), ExitCode::Interrupted);
    assert!(fixture.db_path().exists());
}
