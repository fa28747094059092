//! DynaDupe - duplicate finder for DynamoDB secondary indexes
//!
//! Entry point for the `dynadupe` CLI.

use clap::Parser;
use dynadupe::{
    cli::Cli,
    error::{ExitCode, StructuredError},
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage text on stderr for wrong arguments, stdout for --help
            let _ = err.print();
            std::process::exit(ExitCode::for_parse_error(&err).as_i32());
        }
    };
    let json_errors = cli.json_errors;

    match dynadupe::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                match serde_json::to_string_pretty(&structured) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("[{}] Error: {err:#}", exit_code.code_prefix()),
                }
            } else {
                eprintln!("[{}] Error: {err:#}", exit_code.code_prefix());
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
