#![forbid(unsafe_code)]

//! danmaku-demo binary entry point.

use danmaku_demo::{app, cli, logging};

fn main() {
    let opts = cli::Opts::parse();

    if let Some(path) = &opts.log_file
        && let Err(e) = logging::init(path)
    {
        eprintln!("Cannot open log file {}: {e}", path.display());
        std::process::exit(1);
    }

    if let Err(e) = app::run(&opts) {
        eprintln!("Runtime error: {e}");
        std::process::exit(1);
    }
}
