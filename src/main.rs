#[tokio::main]
async fn main() -> anyhow::Result<()> {
    truecred_dashboard::runtime::run().await
}
