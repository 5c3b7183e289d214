use std::process::ExitCode;

fn main() -> ExitCode {
    fuel_cli::run()
}
