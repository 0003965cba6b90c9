//! Prompt templates.
//!
//! Templates ship inside the binary and can be replaced at runtime by
//! `<prompts-dir>/<name>.txt`.

use crate::error::Error;
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;

const TOWNIE: &str = include_str!("../prompts/townie.txt");
const OPENTOWNIE: &str = include_str!("../prompts/opentownie.txt");

/// Arguments shared by every prompt.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PromptArgs {
    /// User's request to execute.
    pub request: String,
}

/// Resolves prompt templates.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    dir: Option<PathBuf>,
}

impl PromptLibrary {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Template text for `name`, preferring an override file.
    pub async fn template(&self, name: &str) -> Result<String, Error> {
        if let Some(dir) = &self.dir {
            match tokio::fs::read_to_string(dir.join(format!("{name}.txt"))).await {
                Ok(text) => return Ok(text),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        embedded(name)
            .map(str::to_owned)
            .ok_or_else(|| Error::invalid(format!("unknown prompt: {name}")))
    }

    /// The full message text for `name` and the user's request.
    pub async fn render(&self, name: &str, request: &str) -> Result<String, Error> {
        let template = self.template(name).await?;
        Ok(format!("{}\n\nUser Request: {request}", template.trim_end()))
    }
}

fn embedded(name: &str) -> Option<&'static str> {
    match name {
        "townie" => Some(TOWNIE),
        "opentownie" => Some(OPENTOWNIE),
        _ => None,
    }
}
