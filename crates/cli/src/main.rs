use std::process::ExitCode;

fn main() -> ExitCode {
    punchclock_cli::run()
}
