//! Renderer state machine.
//!
//! Folds transport messages into the single [`RendererState`] value the
//! display loop owns. Nothing else reads or writes it.

use crate::status::{FailureMarker, Message, StatusRecord};

/// What the panel is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    /// The last message was a successful status record.
    Normal,
    /// A failure streak below the grace threshold; `last_good` stays up, dimmed.
    Recovering,
    /// No usable status: nothing received yet, or the streak hit the threshold.
    Error,
    /// The transport closed. Terminal.
    ShuttingDown,
}

impl DisplayState {
    /// Uppercase name for logs.
    pub fn name(self) -> &'static str {
        match self {
            DisplayState::Normal => "NORMAL",
            DisplayState::Recovering => "RECOVERING",
            DisplayState::Error => "ERROR",
            DisplayState::ShuttingDown => "SHUTTING_DOWN",
        }
    }
}

/// Renderer-owned state.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererState {
    pub current: DisplayState,
    pub last_good: Option<StatusRecord>,
    pub consecutive_failures: u32,
    /// Most recent failure, for the error reason row.
    pub last_failure: Option<FailureMarker>,
    grace_threshold: u32,
}

impl RendererState {
    /// Initial state: ERROR with nothing to show, i.e. "connecting".
    pub fn new(grace_threshold: u32) -> Self {
        Self {
            current: DisplayState::Error,
            last_good: None,
            consecutive_failures: 0,
            last_failure: None,
            grace_threshold,
        }
    }

    pub fn grace_threshold(&self) -> u32 {
        self.grace_threshold
    }

    /// Fold one message in and return the resulting state.
    ///
    /// Ignored once shut down.
    pub fn apply(&mut self, message: Message) -> DisplayState {
        if self.current == DisplayState::ShuttingDown {
            return self.current;
        }

        match message {
            Message::Status(record) => {
                self.current = DisplayState::Normal;
                self.last_good = Some(record);
                self.consecutive_failures = 0;
                self.last_failure = None;
            }
            Message::Failure(marker) => {
                self.current = if self.last_good.is_some()
                    && self.consecutive_failures < self.grace_threshold
                {
                    DisplayState::Recovering
                } else {
                    DisplayState::Error
                };
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_failure = Some(marker);
            }
        }
        self.current
    }

    /// Enter the terminal state.
    pub fn shut_down(&mut self) {
        self.current = DisplayState::ShuttingDown;
    }

    /// Still waiting on the very first message.
    pub fn is_connecting(&self) -> bool {
        self.current == DisplayState::Error
            && self.last_good.is_none()
            && self.last_failure.is_none()
    }
}
