use std::process::ExitCode;

fn main() -> ExitCode {
    tunelink_cli::run()
}
