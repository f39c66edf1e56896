use std::env;
use std::fs;
use std::path::PathBuf;

/// Directories the server reads from and writes to.
///
/// The project root is resolved from `SOLARSATHI_ROOT`, then the crate
/// manifest directory, then the current working directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub context_dir: PathBuf,
    pub model_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        Self::rooted_at(project_root)
    }

    pub fn rooted_at(project_root: PathBuf) -> Self {
        let context_dir = project_root.join("context");
        let model_dir = project_root.join("prediction_models");
        let log_dir = project_root.join("logs");

        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            project_root,
            context_dir,
            model_dir,
            log_dir,
        }
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("SOLARSATHI_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("context").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub generation_model: String,
    pub embedding_model: String,
    pub reader_base_url: String,
    pub retrieval_enabled: bool,
    pub retrieval_top_k: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(8000);

        let gemini_api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let generation_model = env::var("SOLARSATHI_GENERATION_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash-001".to_string());
        let embedding_model = env::var("SOLARSATHI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-004".to_string());

        let reader_base_url = env::var("SOLARSATHI_READER_BASE_URL")
            .unwrap_or_else(|_| "https://r.jina.ai".to_string())
            .trim_end_matches('/')
            .to_string();

        let retrieval_enabled = env::var("SOLARSATHI_RETRIEVAL")
            .map(|val| matches!(val.trim(), "1" | "true" | "on"))
            .unwrap_or(false);
        let retrieval_top_k = env::var("SOLARSATHI_RETRIEVAL_TOP_K")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(4);

        AppConfig {
            port,
            gemini_api_key,
            generation_model,
            embedding_model,
            reader_base_url,
            retrieval_enabled,
            retrieval_top_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_root() {
        let paths = AppPaths::rooted_at(PathBuf::from("/tmp/solarsathi-test"));
        assert_eq!(
            paths.context_dir,
            PathBuf::from("/tmp/solarsathi-test/context")
        );
        assert_eq!(
            paths.model_dir,
            PathBuf::from("/tmp/solarsathi-test/prediction_models")
        );
    }
}
