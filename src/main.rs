use std::process;

fn main() {
    if let Err(err) = siggrep::cli::run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
