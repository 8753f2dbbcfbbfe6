#[tokio::main]
async fn main() -> anyhow::Result<()> {
    racecapture_dashboard::run().await
}
