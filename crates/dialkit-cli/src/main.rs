#![forbid(unsafe_code)]

fn main() {
    dialkit_cli::logging::init();
    if let Err(error) = dialkit_cli::run_from_env() {
        eprintln!("dialkit: {error}");
        std::process::exit(error.exit_code());
    }
}
