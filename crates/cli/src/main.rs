use std::process::ExitCode;

fn main() -> ExitCode {
    detailbook_cli::run()
}
