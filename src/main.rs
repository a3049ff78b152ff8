//! repodesk binary entry point.

fn main() {
    if let Err(err) = repodesk::cli::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
