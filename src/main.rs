use centrix::{create_client, ClientConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // CENTRIX_URL and CENTRIX_SECRET (or CENTRIX_INSECURE=true)
    let config = ClientConfig::from_env("CENTRIX")?;
    let client = create_client(config)?;
    let channel = "$public:chat";

    let ok = client.publish(channel, &json!({"input": "test"})).await?;
    println!("Publish successful: {}", ok);

    match client.presence(channel).await {
        Ok(presence) => println!("Presence: {:?}", presence),
        Err(e) => println!("Error fetching presence: {}", e),
    }

    match client.history(channel).await {
        Ok(history) => println!("History: {} message(s)", history.len()),
        Err(e) => println!("Error fetching history: {}", e),
    }

    let channels = client.channels().await?;
    println!("Channels: {:?}", channels);

    let stats = client.stats().await?;
    println!("Stats: {} node(s)", stats.nodes.len());

    for i in 1..=3 {
        client.add_publish(channel, &json!({ "input": format!("test{}", i) }))?;
    }
    let results = client.send().await?;
    println!("Sent {} publish commands in one request", results.len());

    Ok(())
}
