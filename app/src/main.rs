#[tokio::main]
async fn main() -> anyhow::Result<()> {
    portal_lib::run().await
}
