use std::env;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::{AppError, Result};
use crate::posts::DEFAULT_POSTS;

/// Extract tags, categories and links from markdown blog posts with an LLM.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct Cli {
    /// Post directories, each containing a README.md
    pub posts: Vec<PathBuf>,

    /// Directory for cached responses, per-post metadata and summary.json
    #[arg(long, env = "METADATA_OUT_DIR", default_value = "data")]
    pub out_dir: PathBuf,

    /// Model name, overrides LLM_MODEL
    #[arg(long)]
    pub model: Option<String>,

    /// Ignore cached responses and call the model for every post
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub posts: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub refresh: bool,
}

impl Config {
    pub fn load(cli: Cli) -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let base_url = env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::ConfigError(format!(
                "Invalid LLM_BASE_URL: {}",
                base_url
            )));
        }

        let api_key = env::var("LLM_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.is_empty());

        let model = match cli.model {
            Some(model) => model,
            None => env::var("LLM_MODEL").unwrap_or_else(|_| "ollama/llama3".to_string()),
        };

        let timeout = env::var("LLM_TIMEOUT_SECS").unwrap_or_else(|_| "120".to_string());
        let timeout = timeout
            .parse::<u64>()
            .map_err(|e| AppError::ConfigError(format!("Invalid LLM_TIMEOUT_SECS: {}", e)))?;

        let posts = if cli.posts.is_empty() {
            DEFAULT_POSTS.iter().map(PathBuf::from).collect()
        } else {
            cli.posts
        };

        Ok(Config {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout),
            posts,
            out_dir: cli.out_dir,
            refresh: cli.refresh,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}
