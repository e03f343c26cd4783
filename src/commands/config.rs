use anyhow::Result;

use crate::config::SharedState;

/// Command to print the effective shared state
pub struct ConfigCommand {
    state: SharedState,
}

impl ConfigCommand {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub fn execute(&self) -> Result<()> {
        println!("{}", self.render()?);
        Ok(())
    }

    pub fn render(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }
}
