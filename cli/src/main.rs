#[tokio::main]
async fn main() {
    charge_rating_cli::run().await;
}
