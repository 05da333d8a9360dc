fn main() {
    if let Err(err) = badge_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
