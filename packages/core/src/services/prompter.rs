//! User Prompting Abstraction
//!
//! Destructive operations confirm with the user before proceeding, and some
//! failures are surfaced as one-line notices rather than errors. The
//! `Prompter` trait is the seam to whatever surface hosts the wiki (a modal
//! dialog in a desktop shell, a TUI prompt, a test double).

use async_trait::async_trait;
use std::sync::Mutex;

/// Notice and confirmation surface
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Show a titled notice; fire and forget
    async fn alert(&self, title: &str, message: &str);

    /// Ask a titled yes/no question; `false` cancels the operation
    async fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Test prompter with a fixed confirm answer and recorded interactions
pub struct StaticPrompter {
    confirm_answer: bool,
    alerts: Mutex<Vec<(String, String)>>,
    confirms: Mutex<Vec<(String, String)>>,
}

impl StaticPrompter {
    /// A prompter that answers yes to every confirmation
    pub fn accepting() -> Self {
        Self {
            confirm_answer: true,
            alerts: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }

    /// A prompter that answers no to every confirmation
    pub fn declining() -> Self {
        Self {
            confirm_answer: false,
            alerts: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }

    /// Notices shown via `alert` so far, as (title, message) pairs
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }

    /// Questions asked via `confirm` so far, as (title, message) pairs
    pub fn confirms(&self) -> Vec<(String, String)> {
        self.confirms.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for StaticPrompter {
    async fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    async fn confirm(&self, title: &str, message: &str) -> bool {
        self.confirms
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        self.confirm_answer
    }
}
