#[tokio::main]
async fn main() {
    if let Err(e) = riskview_lib::run().await {
        eprintln!("riskview: {e}");
        std::process::exit(1);
    }
}
