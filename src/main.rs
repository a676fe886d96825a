#[tokio::main]
async fn main() {
    if let Err(e) = reply_coach_lib::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
