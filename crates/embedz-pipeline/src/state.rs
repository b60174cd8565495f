//! State shared by every block of one run

use embedz_core::{EmbedzError, Mapping, Result};
use embedz_templates::TemplateStore;
use std::io::Read;

/// Where `data: "-"` reads from
#[derive(Debug, Clone, PartialEq)]
pub enum StdinSource {
    /// The process's standard input
    Process,
    /// Fixed text, for embedding and tests
    Text(String),
}

/// Accumulated state of one document-processing run.
///
/// Blocks read and extend the global store and the template store in
/// document order. Standard input can be consumed by a single block.
#[derive(Debug)]
pub struct EmbedzState {
    pub globals: Mapping,
    pub templates: TemplateStore,
    stdin: StdinSource,
    stdin_consumed: bool,
}

impl Default for EmbedzState {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbedzState {
    pub fn new() -> Self {
        Self {
            globals: Mapping::new(),
            templates: TemplateStore::new(),
            stdin: StdinSource::Process,
            stdin_consumed: false,
        }
    }

    /// State whose standard input is `text`
    pub fn with_stdin_text(text: impl Into<String>) -> Self {
        Self {
            stdin: StdinSource::Text(text.into()),
            ..Self::new()
        }
    }

    pub fn stdin_consumed(&self) -> bool {
        self.stdin_consumed
    }

    /// Record that standard input was used for something else, such as the
    /// document itself
    pub fn mark_stdin_consumed(&mut self) {
        self.stdin_consumed = true;
    }

    /// Read standard input. A second read in the same run is an error.
    pub fn take_stdin(&mut self) -> Result<String> {
        if self.stdin_consumed {
            return Err(EmbedzError::Data(
                "Standard input has already been consumed; \
                 only one block per run can read data from \"-\""
                    .to_string(),
            ));
        }
        self.stdin_consumed = true;

        let text = match &mut self.stdin {
            StdinSource::Process => {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
            StdinSource::Text(text) => std::mem::take(text),
        };
        tracing::debug!(bytes = text.len(), "read data from standard input");
        Ok(text)
    }

    /// Clear globals, fragments, preamble and the stdin flag
    pub fn reset(&mut self) {
        self.globals.clear();
        self.templates.clear();
        self.stdin_consumed = false;
    }
}
