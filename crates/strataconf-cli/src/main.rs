use std::process::ExitCode;

fn main() -> ExitCode {
    strataconf_cli::run()
}
