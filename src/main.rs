#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pipvr::bootstrapper::run().await
}
