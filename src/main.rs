fn main() {
    if let Err(e) = carequeue_lib::run() {
        eprintln!("carequeue: {e}");
        std::process::exit(1);
    }
}
