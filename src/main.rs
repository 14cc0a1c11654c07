#[tokio::main]
async fn main() {
    if let Err(e) = langextract_api::run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
