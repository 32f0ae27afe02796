#[tokio::main]
async fn main() -> anyhow::Result<()> {
    opdeck::run().await
}
