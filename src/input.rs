//! Input events as the presentation layer hands them to the store.
//!
//! This module is UI-agnostic: keyboard shortcuts and taps on registered
//! buttons both arrive as an `InputEvent`.

/// All possible input events, normalized from keyboard, mouse, and touch sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press from keyboard.
    Key(char),
    /// A click/tap on a button, identified by a semantic action ID
    /// (see `clans::actions`).
    Click(u16),
}

impl InputEvent {
    /// Parse a scripted input token: a single character is a key press,
    /// `#<n>` is a click on action `n`.
    pub fn parse(token: &str) -> Option<InputEvent> {
        if let Some(id) = token.strip_prefix('#') {
            return id.parse().ok().map(InputEvent::Click);
        }
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(InputEvent::Key(c)),
            _ => None,
        }
    }
}
