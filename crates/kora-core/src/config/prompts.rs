use std::collections::HashMap;
use tracing::{info, warn};

use super::shellexpand;

/// Prompts sent to the AI backend, loaded from `{data_dir}/prompts/` at startup.
///
/// If the file or a section is missing, the bundled defaults are used.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// System preamble prepended to every chat turn.
    pub system: String,
    /// Instruction sent alongside an image the user attached.
    pub image_analysis: String,
}

impl Default for Prompts {
    fn default() -> Self {
        let sections = parse_markdown_sections(BUNDLED_SYSTEM_PROMPT);
        Self {
            system: sections.get("System").cloned().unwrap_or_else(|| {
                "You are KORA AI, a helpful assistant. You should assist with all topics.".into()
            }),
            image_analysis: sections.get("Image Analysis").cloned().unwrap_or_else(|| {
                "Describe this image. If it contains text, transcribe and translate it. \
                 If it contains a question or exercise, answer it."
                    .into()
            }),
        }
    }
}

/// Bundled prompt file, embedded at compile time.
const BUNDLED_SYSTEM_PROMPT: &str = include_str!("../../../../prompts/SYSTEM_PROMPT.md");

/// Deploy the bundled prompt file to `{data_dir}/prompts/`, creating the directory if needed.
///
/// Never overwrites an existing file so user edits are preserved.
pub fn install_bundled_prompts(data_dir: &str) {
    let expanded = shellexpand(data_dir);
    let dir = std::path::Path::new(&expanded).join("prompts");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("prompts: failed to create {}: {e}", dir.display());
        return;
    }

    let dest = dir.join("SYSTEM_PROMPT.md");
    if !dest.exists() {
        if let Err(e) = std::fs::write(&dest, BUNDLED_SYSTEM_PROMPT) {
            warn!("prompts: failed to write {}: {e}", dest.display());
        } else {
            info!("prompts: deployed bundled SYSTEM_PROMPT.md");
        }
    }
}

impl Prompts {
    /// Load prompts from `{data_dir}/prompts/SYSTEM_PROMPT.md`.
    pub fn load(data_dir: &str) -> Self {
        let mut prompts = Self::default();
        let dir = shellexpand(data_dir);

        let prompt_path = format!("{dir}/prompts/SYSTEM_PROMPT.md");
        if let Ok(content) = std::fs::read_to_string(&prompt_path) {
            let sections = parse_markdown_sections(&content);
            if let Some(v) = sections.get("System") {
                prompts.system = v.clone();
            }
            if let Some(v) = sections.get("Image Analysis") {
                prompts.image_analysis = v.clone();
            }
        }

        prompts
    }
}

/// Split a markdown document into `## Header` → body sections.
fn parse_markdown_sections(content: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    let mut current_key: Option<String> = None;
    let mut current_body = String::new();

    let mut flush = |key: Option<String>, body: &str| {
        if let Some(key) = key {
            let trimmed = body.trim();
            if !trimmed.is_empty() {
                sections.insert(key, trimmed.to_string());
            }
        }
    };

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            flush(current_key.take(), &current_body);
            current_key = Some(header.trim().to_string());
            current_body.clear();
        } else if current_key.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    flush(current_key, &current_body);

    sections
}
