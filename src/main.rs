use std::process::ExitCode;

fn main() -> ExitCode {
    allanime_extension_lib::run()
}
