use clap::Parser;
use post_metadata::{
    config::{Cli, Config},
    llm::LlmClient,
    pipeline,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration
    let config = Config::load(Cli::parse())?;
    log::info!(
        "Extracting metadata for {} posts with {} into {}",
        config.posts.len(),
        config.model,
        config.out_dir.display()
    );

    let llm = LlmClient::new(&config)?;
    let report = pipeline::run(&config, &llm).await?;

    if !report.failed.is_empty() {
        log::warn!("Failed posts: {}", report.failed.join(", "));
    }

    Ok(())
}
