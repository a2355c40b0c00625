//! Document Settings

use crate::error::{DomError, DomResult};
use crate::schema::WhitespaceMode;

/// Per-document configuration
#[derive(Debug, Clone)]
pub struct DomSettings {
    /// Whitespace handling for elements without a definition
    whitespace: WhitespaceMode,

    /// Treat unbound `id` and `xml:id` attributes as identifiers
    implicit_ids: bool,

    /// Emit a trace event for every structural mutation
    trace_mutations: bool,

    sealed: bool,
}

impl DomSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn whitespace(&self) -> WhitespaceMode {
        self.whitespace
    }

    pub fn implicit_ids(&self) -> bool {
        self.implicit_ids
    }

    pub fn trace_mutations(&self) -> bool {
        self.trace_mutations
    }

    pub fn set_whitespace(&mut self, mode: WhitespaceMode) -> DomResult<()> {
        self.check_writable()?;
        self.whitespace = mode;
        Ok(())
    }

    pub fn set_implicit_ids(&mut self, enabled: bool) -> DomResult<()> {
        self.check_writable()?;
        self.implicit_ids = enabled;
        Ok(())
    }

    pub fn set_trace_mutations(&mut self, enabled: bool) -> DomResult<()> {
        self.check_writable()?;
        self.trace_mutations = enabled;
        Ok(())
    }

    /// Freeze the settings; a document seals the copy it is created with
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn check_writable(&self) -> DomResult<()> {
        if self.sealed {
            Err(DomError::read_only("settings are sealed"))
        } else {
            Ok(())
        }
    }
}

impl Default for DomSettings {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceMode::Preserve,
            implicit_ids: true,
            trace_mutations: false,
            sealed: false,
        }
    }
}
