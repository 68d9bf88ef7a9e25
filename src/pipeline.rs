use std::fs;
use std::path::Path;

use log::{debug, error, info, warn};

use crate::cache::{load_raw, save_raw, should_use_cache, write_pretty};
use crate::config::Config;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::models::{Metadata, RawResponse, Summary};
use crate::parser::normalize;
use crate::posts::{Post, build_prompt, summary_path};

/// Outcome of one run over the configured posts.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summary: Summary,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Processes every configured post in order, then rewrites `summary.json`.
///
/// A post that fails is logged and left out of the summary; only failing to
/// create the output directory or to write the summary aborts the run.
pub async fn run(config: &Config, llm: &LlmClient) -> Result<RunReport> {
    fs::create_dir_all(&config.out_dir)?;
    let mut report = RunReport::default();

    for dir in &config.posts {
        let post = Post::resolve(dir);
        if !post.source_path.exists() {
            warn!("[WARN] {} does not exist, skipping.", post.source_path.display());
            report.skipped.push(post.name);
            continue;
        }

        match process_post(config, llm, &post).await {
            Ok(Some(metadata)) => {
                info!(
                    "[OK] Metadata for {} saved to {}",
                    post.name,
                    post.metadata_path(&config.out_dir).display()
                );
                report.summary.insert(post.name, metadata);
            }
            Ok(None) => {
                error!("[FAIL] Could not extract metadata for {}", post.name);
                report.failed.push(post.name);
            }
            Err(e) => {
                error!("[FAIL] {}: {}", post.name, e);
                report.failed.push(post.name);
            }
        }
    }

    let summary_path = summary_path(&config.out_dir);
    write_pretty(&summary_path, &report.summary)?;
    info!(
        "Summary of {} posts saved to {} ({} skipped, {} failed)",
        report.summary.len(),
        summary_path.display(),
        report.skipped.len(),
        report.failed.len()
    );

    Ok(report)
}

async fn process_post(config: &Config, llm: &LlmClient, post: &Post) -> Result<Option<Metadata>> {
    let cache_path = post.cache_path(&config.out_dir);
    debug!(
        "[DEBUG] {}: source {}, cache {}",
        post.name,
        post.source_path.display(),
        cache_path.display()
    );

    let raw = match cached_response(config, post, &cache_path) {
        Some(raw) => raw,
        None => {
            let content = fs::read_to_string(&post.source_path)?;
            let raw = llm.invoke(&build_prompt(&content)).await?;
            save_raw(&cache_path, &raw)?;
            raw
        }
    };

    let Some(metadata) = normalize(&raw) else {
        return Ok(None);
    };
    write_pretty(&post.metadata_path(&config.out_dir), &metadata)?;

    Ok(Some(metadata))
}

fn cached_response(config: &Config, post: &Post, cache_path: &Path) -> Option<RawResponse> {
    if config.refresh || !should_use_cache(cache_path, &post.source_path) {
        return None;
    }

    match load_raw(cache_path) {
        Ok(raw) => {
            info!("[CACHE] Using cached response for {}", post.name);
            Some(raw)
        }
        Err(e) => {
            warn!(
                "[WARN] Ignoring unreadable cache {}: {}",
                cache_path.display(),
                e
            );
            None
        }
    }
}
