//! HashKeeper - file integrity ledger
//!
//! Entry point for the HashKeeper CLI application.

use clap::Parser;
use hashkeeper::{
    cli::Cli,
    error::{ExitCode, StructuredError},
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(ExitCode::InvalidArguments.as_i32());
        }
        Err(err) => err.exit(),
    };
    let json_errors = cli.json_errors;

    match hashkeeper::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::from_error(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                }
            } else if exit_code == ExitCode::Interrupted {
                eprintln!("[{}] Interrupted", exit_code.code_prefix());
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
