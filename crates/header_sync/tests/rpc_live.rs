use std::env;

use header_sync::net::rpc::RpcClient;

/// Integration-style test that walks a few headers against a real node.
///
/// This test is skipped unless a node is configured. To use it:
/// - start a Bitcoin-style node with RPC enabled;
/// - set:
///   - `BITCOIN_RPC_URL` (e.g. `http://127.0.0.1:8332`);
///   - `BITCOIN_RPC_USER` / `BITCOIN_RPC_PASSWORD` if the node requires them;
/// - run: `cargo test -p header_sync live_node_header_fetch`.
#[tokio::test]
async fn live_node_header_fetch() -> Result<(), Box<dyn std::error::Error>> {
    let url = match env::var("BITCOIN_RPC_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("BITCOIN_RPC_URL not set; skipping live node test");
            return Ok(());
        }
    };

    let mut client = RpcClient::new(&url)?;
    if let (Ok(user), Ok(password)) = (
        env::var("BITCOIN_RPC_USER"),
        env::var("BITCOIN_RPC_PASSWORD"),
    ) {
        client = client.with_basic_auth(user, password);
    }

    let height = client.get_block_count().await?;
    eprintln!("live_node_header_fetch: node height {height}");
    assert!(height > 0);

    let best = client.get_best_block_hash().await?;
    let header = client.get_block_header(&best).await?;
    assert_eq!(header.hash, best);
    // The best block has no successor yet.
    assert!(!header.has_successor());

    Ok(())
}
