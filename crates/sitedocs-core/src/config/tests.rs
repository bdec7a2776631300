use std::io::Write;
use std::path::PathBuf;

use serial_test::serial;

use super::*;
use crate::vault::MockVaultProvider;

const ENV_KEYS: [&str; 11] = [
    "SITEDOCS_DOCUMENTS_DIR",
    "SITEDOCS_EMBEDDING_PROVIDER",
    "SITEDOCS_EMBEDDING_MODEL",
    "SITEDOCS_EMBEDDING_BASE_URL",
    "SITEDOCS_CHUNK_SIZE",
    "SITEDOCS_CHUNK_OVERLAP",
    "SITEDOCS_TOP_K",
    "SITEDOCS_TIMEOUT_EMBEDDING",
    "SITEDOCS_TIMEOUT_BUILD",
    "SITEDOCS_PROJECTS",
    "SITEDOCS_CONFIG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitedocs.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    (dir, path)
}

#[test]
fn defaults_reproduce_baseline() {
    let config = Config::default();
    assert!(config.documents_dir.is_none());
    assert!(config.projects.is_empty());
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
    assert_eq!(config.embedding.model, "text-embedding-3-small");
    assert_eq!(config.embedding.batch_size, 64);
    assert_eq!(config.embedding.max_retries, 0);
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert_eq!(config.retrieval.top_k, 4);
    assert_eq!(config.index.max_file_size, 50 * 1024 * 1024);
    assert_eq!(config.index.build_timeout_seconds, 300);
    assert_eq!(config.timeouts.embedding_seconds, 30);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/sitedocs.toml")).unwrap();
    assert_eq!(config.retrieval.top_k, 4);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let (_dir, path) = write_config(
        r#"
documents_dir = "/srv/site_files"
projects = ["Tower A", "ЖК Север"]

[embedding]
provider = "ollama"
model = "nomic-embed-text"
base_url = "http://gpu-box:11434"

[chunking]
chunk_size = 800
chunk_overlap = 100

[retrieval]
top_k = 6
"#,
    );
    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.documents_dir, Some(PathBuf::from("/srv/site_files")));
    assert_eq!(config.projects, ["Tower A", "ЖК Север"]);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(config.embedding.base_url.as_deref(), Some("http://gpu-box:11434"));
    assert_eq!(config.chunking.chunk_size, 800);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.retrieval.top_k, 6);
    assert_eq!(config.index.build_timeout_seconds, 300);
}

#[test]
#[serial]
fn malformed_toml_is_an_error() {
    let (_dir, path) = write_config("documents_dir = [");
    clear_env();
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn overlap_not_smaller_than_chunk_fails_at_load() {
    let (_dir, path) = write_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n");
    clear_env();
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("chunk_overlap"));
}

#[test]
fn zero_top_k_is_rejected() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn zero_timeout_is_rejected() {
    let mut config = Config::default();
    config.index.build_timeout_seconds = 0;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let (_dir, path) = write_config("[retrieval]\ntop_k = 6\n");
    clear_env();
    unsafe {
        std::env::set_var("SITEDOCS_DOCUMENTS_DIR", "/data/docs");
        std::env::set_var("SITEDOCS_EMBEDDING_PROVIDER", "ollama");
        std::env::set_var("SITEDOCS_EMBEDDING_MODEL", "mxbai-embed-large");
        std::env::set_var("SITEDOCS_TOP_K", "2");
        std::env::set_var("SITEDOCS_CHUNK_SIZE", "500");
        std::env::set_var("SITEDOCS_CHUNK_OVERLAP", "50");
        std::env::set_var("SITEDOCS_TIMEOUT_BUILD", "120");
        std::env::set_var("SITEDOCS_PROJECTS", "Tower A, Tower B,,");
    }

    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.documents_dir, Some(PathBuf::from("/data/docs")));
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.embedding.model, "mxbai-embed-large");
    assert_eq!(config.retrieval.top_k, 2);
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.chunking.chunk_overlap, 50);
    assert_eq!(config.index.build_timeout_seconds, 120);
    assert_eq!(config.projects, ["Tower A", "Tower B"]);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("SITEDOCS_EMBEDDING_PROVIDER", "pinecone");
        std::env::set_var("SITEDOCS_TOP_K", "many");
    }
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    clear_env();

    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
    assert_eq!(config.retrieval.top_k, 4);
}

#[tokio::test]
async fn resolve_secrets_prefers_prefixed_key() {
    let vault = MockVaultProvider::new()
        .with_secret("SITEDOCS_OPENAI_API_KEY", "sk-prefixed")
        .with_secret("OPENAI_API_KEY", "sk-plain");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.openai_api_key.as_ref().map(Secret::expose),
        Some("sk-prefixed")
    );
}

#[tokio::test]
async fn resolve_secrets_falls_back_to_plain_key() {
    let vault = MockVaultProvider::new().with_secret("OPENAI_API_KEY", "sk-plain");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.openai_api_key.as_ref().map(Secret::expose),
        Some("sk-plain")
    );
}

#[test]
fn secrets_are_not_serialized() {
    let mut config = Config::default();
    config.secrets.openai_api_key = Some(Secret::new("sk-hidden"));
    let toml = toml::to_string(&config).unwrap();
    assert!(!toml.contains("sk-hidden"));
}
