//! Binary entry point for the Studyhall realtime server.

#[tokio::main]
async fn main() {
    if let Err(e) = lib_studyhall::init().await {
        eprintln!("❌ Fatal error: {e:?}");
        std::process::exit(1);
    }
}
