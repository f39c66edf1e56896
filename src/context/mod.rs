//! Static domain knowledge read from markdown files in the context directory.

use std::fs;
use std::path::PathBuf;

use crate::core::errors::ApiError;

pub const SUBSIDY_FILE: &str = "subsidy_info.md";
pub const GENERAL_FILE: &str = "general_solar_context.md";

const SUBSIDY_FALLBACK: &str = "Subsidy information is currently unavailable.";
const GENERAL_FALLBACK: &str = "General solar information is currently unavailable.";

#[derive(Clone)]
pub struct ContextStore {
    context_dir: PathBuf,
}

impl ContextStore {
    pub fn new(context_dir: PathBuf) -> Self {
        Self { context_dir }
    }

    /// Subsidy rules only. A missing file here is an error: the subsidy
    /// enquiry endpoint is useless without it.
    pub fn subsidy(&self) -> Result<String, ApiError> {
        let path = self.context_dir.join(SUBSIDY_FILE);
        fs::read_to_string(&path)
            .map_err(|_| ApiError::Internal("Subsidy context file not found.".to_string()))
    }

    /// Both context files under their section headings. Either file may be
    /// missing; the section degrades to a placeholder and we log it.
    pub fn combined(&self) -> String {
        let subsidy = self.read_or_fallback(SUBSIDY_FILE, SUBSIDY_FALLBACK);
        let general = self.read_or_fallback(GENERAL_FILE, GENERAL_FALLBACK);

        format!(
            "## Subsidy Information\n{}\n\n## General Solar Information\n{}\n",
            subsidy, general
        )
    }

    /// Every context document as (source name, content), for indexing.
    pub fn documents(&self) -> Vec<(String, String)> {
        [SUBSIDY_FILE, GENERAL_FILE]
            .iter()
            .filter_map(|name| {
                let path = self.context_dir.join(name);
                fs::read_to_string(&path)
                    .ok()
                    .map(|content| (name.to_string(), content))
            })
            .collect()
    }

    fn read_or_fallback(&self, name: &str, fallback: &str) -> String {
        let path = self.context_dir.join(name);
        match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                tracing::warn!("Context file {} not found, using placeholder", path.display());
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_files(files: &[(&str, &str)]) -> (tempfile::TempDir, ContextStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let store = ContextStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn subsidy_errors_when_file_missing() {
        let (_dir, store) = store_with_files(&[]);
        assert!(store.subsidy().is_err());
    }

    #[test]
    fn combined_degrades_per_missing_file() {
        let (_dir, store) = store_with_files(&[(SUBSIDY_FILE, "40% for rooftop systems")]);
        let combined = store.combined();
        assert!(combined.contains("40% for rooftop systems"));
        assert!(combined.contains(GENERAL_FALLBACK));
        assert!(combined.contains("## Subsidy Information"));
    }

    #[test]
    fn documents_lists_only_present_files() {
        let (_dir, store) = store_with_files(&[(GENERAL_FILE, "Panels face south.")]);
        let docs = store.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, GENERAL_FILE);
    }
}
