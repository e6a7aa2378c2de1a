//! Conversation Data Model
//!
//! A call's history is an ordered sequence of [`Turn`]s. The order is
//! load-bearing: it is replayed verbatim to the completion backend as the
//! prompt context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The speaker of a single conversational turn.
///
/// Only the two conversational roles are stored in history; the system
/// instruction travels separately with each completion request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

// Implement Display for easy conversion to a string, useful for logging and
// for the Anthropic wire format.
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged unit of conversational text.
///
/// Content is only ever replaced wholesale (see the interrupt resolver),
/// never edited in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
