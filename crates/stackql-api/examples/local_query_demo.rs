use stackql::logging::LogConfig;
use stackql::{ClientConfig, StackQL};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install, download and query events are logged at info level
    let _guard = LogConfig::info().init()?;

    println!("=== StackQL Local Query Demo ===\n");

    // First run downloads the binary into ./.stackql
    let config = ClientConfig::default()
        .with_max_results(100)
        .with_page_limit(10)
        .with_output_format("json");
    let mut client = StackQL::initialize(config).await?;

    if let Some(path) = client.binary_path() {
        println!("Binary: {}", path.display());
    }
    println!("Flags:  {}\n", client.params().join(" "));

    let version = client.get_version().await?;
    println!("Version: {} ({})\n", version.version, version.sha);

    println!("1. Listing providers...");
    let providers = client.execute_json("SHOW PROVIDERS").await?;
    println!("{}", serde_json::to_string_pretty(&providers)?);

    println!("\n2. Running a batch...");
    let results = client
        .execute_queries_async(["REGISTRY LIST github", "SHOW SERVICES IN github"])
        .await?;
    for (i, result) in results.iter().enumerate() {
        println!("--- result {} ---\n{}", i + 1, result);
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
