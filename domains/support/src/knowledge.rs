//! Knowledge base loading
//!
//! Every `*.md` file in the knowledge directory, in file-name order, is
//! combined into one document the first time it is needed.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;

const HEADER: &str = "# Snipr Knowledge Base";

/// Lazily loaded, cached knowledge base
#[derive(Debug)]
pub struct KnowledgeBase {
    dir: PathBuf,
    combined: OnceCell<String>,
}

impl KnowledgeBase {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            combined: OnceCell::new(),
        }
    }

    /// Knowledge base from already-combined text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            dir: PathBuf::new(),
            combined: OnceCell::new_with(Some(text.into())),
        }
    }

    /// Combined knowledge text, read from disk on first use
    pub async fn text(&self) -> &str {
        self.combined
            .get_or_init(|| load_knowledge(&self.dir))
            .await
            .as_str()
    }
}

/// Read and combine the markdown files under `dir`.
///
/// A missing directory or unreadable file is logged and skipped.
pub async fn load_knowledge(dir: &Path) -> String {
    let mut sections = vec![HEADER.to_string()];

    let mut names = Vec::new();
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.ends_with(".md") {
                        names.push(name);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Failed to list knowledge directory");
                    break;
                }
            }
        },
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Knowledge directory unavailable");
        }
    }
    names.sort();

    for name in names {
        match tokio::fs::read_to_string(dir.join(&name)).await {
            Ok(content) => sections.push(format!("## {}\n{}", name, content)),
            Err(e) => tracing::warn!(file = %name, error = %e, "Skipping unreadable knowledge file"),
        }
    }

    tracing::info!(files = sections.len() - 1, "Loaded knowledge base");
    sections.join("\n\n")
}
