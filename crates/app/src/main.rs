use std::process;

mod logging;
mod replay;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let parsed = match replay::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("forma: {err}");
            replay::print_help();
            process::exit(2);
        }
    };
    if parsed.help {
        replay::print_help();
        return;
    }

    let level = match logging::resolve_level(parsed.log_level.as_deref()) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("forma: {err}");
            process::exit(2);
        }
    };
    logging::setup_tracing(level);
    tracing::info!("forma starting");

    if let Err(err) = replay::run(&parsed) {
        eprintln!("forma: {err}");
        process::exit(1);
    }
}
