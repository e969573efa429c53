//! Binary entrypoint for fontview.

fn main() {
    if let Err(err) = fontview_cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
