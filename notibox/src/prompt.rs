//! Interactive confirmation prompt.

use async_trait::async_trait;
use inquire::Confirm;

use crate::controller::ConfirmPrompt;

/// Terminal prompt backed by inquire. Runs on the blocking pool so the
/// runtime stays responsive while waiting for input.
pub struct TerminalPrompt;

#[async_trait]
impl ConfirmPrompt for TerminalPrompt {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            Confirm::new(&prompt)
                .with_default(false)
                .prompt()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }
}
