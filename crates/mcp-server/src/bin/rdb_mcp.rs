use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    rdb_mcp::main_entry().await
}
