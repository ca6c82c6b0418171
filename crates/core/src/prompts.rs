//! Prompt Library
//!
//! Agent instructions live as Markdown files in a prompts directory, one file
//! per agent, keyed by file stem (`quiz_generator.md` -> `quiz_generator`).

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    prompts: HashMap<String, String>,
}

impl PromptLibrary {
    /// Loads every `*.md` file in `dir`. Other files are ignored.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut prompts = HashMap::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Could not read prompts directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
                let key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("Could not get file stem")?
                    .to_string();
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Could not read prompt {}", path.display()))?;
                prompts.insert(key, content);
            }
        }
        debug!(count = prompts.len(), dir = %dir.display(), "Loaded prompts");
        Ok(Self { prompts })
    }

    pub fn from_map(prompts: HashMap<String, String>) -> Self {
        Self { prompts }
    }

    /// Returns the prompt named `key`, or an error naming the missing file.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.prompts
            .get(key)
            .map(String::as_str)
            .with_context(|| format!("Missing prompt template: '{}' ({}.md)", key, key))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
