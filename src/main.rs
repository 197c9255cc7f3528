use std::process::ExitCode;

fn main() -> ExitCode {
    droidpad_lib::run()
}
