//! Terminal prompts for interactive mode

use dialoguer::{theme::ColorfulTheme, Input};
use vmprov_common::{Error, Prompter, Result};

/// Reads answers from the terminal
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        // The builder applies defaults, so empty answers are passed through.
        let prompt = if default.is_empty() {
            question.to_string()
        } else {
            format!("{} [{}]", question, default)
        };

        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
    }
}
