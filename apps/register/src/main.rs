//! # Duka Register Entry Point
//!
//! Setup lives in `lib.rs` so it can be tested without a terminal.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duka_register::run().await
}
