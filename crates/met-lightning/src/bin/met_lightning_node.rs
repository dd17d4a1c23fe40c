//! Met.no lightning node binary

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    met_lightning::run_node().await
}
