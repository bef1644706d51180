fn main() {
    if let Err(e) = screen_grab_lib::run() {
        eprintln!("screen-grab: {}", e);
        std::process::exit(1);
    }
}
