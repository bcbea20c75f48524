#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vocab_tutor::run().await
}
