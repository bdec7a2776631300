use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SITEDOCS_DOCUMENTS_DIR") {
            self.documents_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("SITEDOCS_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid SITEDOCS_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SITEDOCS_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("SITEDOCS_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("SITEDOCS_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_size = n;
        }
        if let Ok(v) = std::env::var("SITEDOCS_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("SITEDOCS_TOP_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.retrieval.top_k = n;
        }
        if let Ok(v) = std::env::var("SITEDOCS_TIMEOUT_EMBEDDING")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.embedding_seconds = secs;
        }
        if let Ok(v) = std::env::var("SITEDOCS_TIMEOUT_BUILD")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.index.build_timeout_seconds = secs;
        }
        if let Ok(v) = std::env::var("SITEDOCS_PROJECTS") {
            self.projects = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
}
