use std::process::ExitCode;

fn main() -> ExitCode {
    shipquote_cli::run()
}
