use std::io;
use std::process::ExitCode;

use skin_stealer_rs::*;

fn main() -> ExitCode {
    let args = match parse_cli(std::env::args_os(), &mut io::stderr()) {
        Ok(args) => args,
        Err(code) => return code,
    };
    init_logging(args.debug);
    handle_download(&args)
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
