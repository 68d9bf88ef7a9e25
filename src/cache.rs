use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::Result;
use crate::models::RawResponse;

/// True iff the cache entry exists and was modified strictly after the source.
pub fn should_use_cache(cache_path: &Path, source_path: &Path) -> bool {
    let (Some(cached_at), Some(source_at)) = (modified(cache_path), modified(source_path)) else {
        return false;
    };
    debug!(
        "Cache {} modified {}, source {} modified {}",
        cache_path.display(),
        rfc3339(cached_at),
        source_path.display(),
        rfc3339(source_at)
    );
    cached_at > source_at
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

pub fn load_raw(cache_path: &Path) -> Result<RawResponse> {
    let reader = BufReader::new(File::open(cache_path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_raw(cache_path: &Path, raw: &RawResponse) -> Result<()> {
    write_pretty(cache_path, raw)
}

/// Pretty-prints `value` to `path`, replacing whatever was there.
pub fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use std::time::Duration;

    fn touch(path: &Path, at: SystemTime) {
        let file = File::options().create(true).append(true).open(path).unwrap();
        file.set_modified(at).unwrap();
    }

    #[test]
    fn absent_cache_is_never_used() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("README.md");
        touch(&source, SystemTime::now());
        assert!(!should_use_cache(&dir.path().join("post.llm.json"), &source));
    }

    #[test]
    fn cache_newer_than_source_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("README.md");
        let cache = dir.path().join("post.llm.json");
        let now = SystemTime::now();
        touch(&source, now - Duration::from_secs(60));
        touch(&cache, now);
        assert!(should_use_cache(&cache, &source));
    }

    #[test]
    fn source_newer_or_equal_forces_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("README.md");
        let cache = dir.path().join("post.llm.json");
        let now = SystemTime::now();
        touch(&cache, now - Duration::from_secs(60));
        touch(&source, now);
        assert!(!should_use_cache(&cache, &source));

        touch(&cache, now);
        assert!(!should_use_cache(&cache, &source));
    }

    #[test]
    fn raw_response_survives_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("post.llm.json");
        let raw = RawResponse::Structured(Metadata {
            tags: vec!["rust".into()],
            categories: vec![],
            links: vec!["https://example.com".into()],
        });
        save_raw(&cache, &raw).unwrap();
        assert_eq!(load_raw(&cache).unwrap(), raw);
    }

    #[test]
    fn malformed_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("post.llm.json");
        std::fs::write(&cache, "{ truncated").unwrap();
        assert!(load_raw(&cache).is_err());
    }
}
