use std::path::{Path, PathBuf};

pub const DEFAULT_POSTS: &[&str] = &["../bootstrapping-setup", "../git-publish", "../w-slash-ai"];

const SOURCE_FILE: &str = "README.md";

/// A post directory and the markdown document inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub name: String,
    pub source_path: PathBuf,
}

impl Post {
    pub fn resolve(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.to_string_lossy().into_owned());
        let source_path = dir.join(SOURCE_FILE);
        Post { name, source_path }
    }

    pub fn cache_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(format!("{}.llm.json", self.name))
    }

    pub fn metadata_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(format!("{}.metadata.json", self.name))
    }
}

pub fn summary_path(out_dir: &Path) -> PathBuf {
    out_dir.join("summary.json")
}

pub fn build_prompt(content: &str) -> String {
    let mut result = String::with_capacity(content.len() + 300);
    result.push_str("\nExtract the following metadata from the markdown blog post below:\n");
    result.push_str("- Tags (as a list of keywords)\n");
    result.push_str("- Categories (as a list)\n");
    result.push_str("- Links (as a list of URLs)\n\n");
    result.push_str("Markdown:\n---\n");
    result.push_str(content);
    result.push_str("\n---\n\nRespond in JSON with keys: tags, categories, links.\n");
    result
}
