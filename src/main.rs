fn main() {
    if let Err(err) = feature_diagram::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
