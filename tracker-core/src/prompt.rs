//! Queued user prompts.
//!
//! Operations that need user input enqueue a [`Prompt`] and return at once.
//! The UI shows pending prompts and answers them through
//! [`Encounter::resolve_prompt`](crate::Encounter::resolve_prompt), which runs
//! the callback exactly once. Dismissing a prompt drops the callback unrun.

use crate::encounter::Encounter;
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Runs when a prompt is answered.
pub type PromptCallback = Box<dyn FnOnce(&mut Encounter, &str) -> Outcome>;

/// Identifier of a queued prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromptId(pub u64);

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request for user input.
pub struct Prompt {
    pub id: PromptId,
    /// Text shown to the user.
    pub content: String,
    /// Name of the input the response is read from.
    pub input_selector: String,
    /// Pre-filled value, e.g. a suggested initiative roll.
    pub default_value: Option<String>,
    callback: PromptCallback,
}

impl Prompt {
    pub(crate) fn into_callback(self) -> PromptCallback {
        self.callback
    }

    pub fn view(&self) -> PromptView {
        PromptView {
            id: self.id,
            content: self.content.clone(),
            input_selector: self.input_selector.clone(),
            default_value: self.default_value.clone(),
        }
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("id", &self.id)
            .field("content", &self.content)
            .field("input_selector", &self.input_selector)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}

/// Read-only copy of a prompt for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptView {
    pub id: PromptId,
    pub content: String,
    pub input_selector: String,
    pub default_value: Option<String>,
}

/// FIFO of pending prompts.
#[derive(Debug, Default)]
pub struct PromptQueue {
    next_id: u64,
    pending: VecDeque<Prompt>,
}

impl PromptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        content: impl Into<String>,
        input_selector: impl Into<String>,
        default_value: Option<String>,
        callback: PromptCallback,
    ) -> PromptId {
        self.next_id += 1;
        let id = PromptId(self.next_id);
        self.pending.push_back(Prompt {
            id,
            content: content.into(),
            input_selector: input_selector.into(),
            default_value,
            callback,
        });
        id
    }

    /// Remove a prompt by id.
    pub fn take(&mut self, id: PromptId) -> Option<Prompt> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        self.pending.remove(index)
    }

    pub fn front(&self) -> Option<&Prompt> {
        self.pending.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> PromptCallback {
        Box::new(|_, _| Outcome::Applied)
    }

    #[test]
    fn test_prompts_are_fifo() {
        let mut queue = PromptQueue::new();
        let first = queue.push("First?", "response", None, noop());
        let second = queue.push("Second?", "response", Some("12".into()), noop());

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.front().map(|p| p.id), Some(first));
        assert_ne!(first, second);
    }

    #[test]
    fn test_take_by_id() {
        let mut queue = PromptQueue::new();
        let first = queue.push("First?", "response", None, noop());
        let second = queue.push("Second?", "response", None, noop());

        let taken = queue.take(second).unwrap();
        assert_eq!(taken.content, "Second?");
        assert!(queue.take(second).is_none());
        assert_eq!(queue.front().map(|p| p.id), Some(first));
    }

    #[test]
    fn test_view_copies_fields() {
        let mut queue = PromptQueue::new();
        let id = queue.push("Initiative?", "initiative", Some("14".into()), noop());
        let view = queue.front().unwrap().view();
        assert_eq!(view.id, id);
        assert_eq!(view.input_selector, "initiative");
        assert_eq!(view.default_value.as_deref(), Some("14"));
    }
}
