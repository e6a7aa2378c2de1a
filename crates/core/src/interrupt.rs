//! Interrupt Resolution
//!
//! When the caller starts speaking over the assistant, the relay reports the
//! exact text the caller heard before interrupting. The recorded history must
//! then be rewritten so it never attributes to the assistant content that was
//! generated but never delivered. Truncating the record after the fact is
//! cheaper and simpler than cancelling the live backend stream; the wasted
//! generation is accepted.

use crate::convo::{Role, Turn};
use crate::store::{SessionStore, StoreError};

/// Computes the post-interrupt history for `turns`, given the verbatim text
/// the caller `heard` before interrupting.
///
/// Scans from the front for the first assistant turn containing `heard` as a
/// substring (first occurrence in document order: at most one assistant turn
/// is ever in flight, and on a repeated interrupt the already-truncated turn
/// re-matches, making resolution idempotent). That turn's content is cut to
/// end exactly at the end of the match, and every later assistant turn is
/// dropped as necessarily unheard; later user turns are preserved.
///
/// Returns the index of the interrupted turn and the replacement tail from
/// that index, or `None` when nothing matches. A miss is expected, not an
/// error: the interrupt may race with the reply completing normally.
pub fn resolve(turns: &[Turn], heard: &str) -> Option<(usize, Vec<Turn>)> {
    if heard.is_empty() {
        return None;
    }

    let (index, pos) = turns.iter().enumerate().find_map(|(i, turn)| {
        if turn.role == Role::Assistant {
            turn.content.find(heard).map(|pos| (i, pos))
        } else {
            None
        }
    })?;

    let truncated = turns[index].content[..pos + heard.len()].to_string();
    let mut tail = vec![Turn::assistant(truncated)];
    tail.extend(
        turns[index + 1..]
            .iter()
            .filter(|turn| turn.role != Role::Assistant)
            .cloned(),
    );

    Some((index, tail))
}

/// Applies an interrupt to the stored history for `call_sid`.
///
/// Returns `Ok(true)` when a turn was truncated and `Ok(false)` when the
/// interrupt matched nothing. The snapshot-then-replace pair is race-free
/// because events for one call are handled serially.
pub fn apply(store: &SessionStore, call_sid: &str, heard: &str) -> Result<bool, StoreError> {
    let turns = store.get(call_sid)?;
    match resolve(&turns, heard) {
        Some((index, tail)) => {
            store.replace_from(call_sid, index, tail)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_interrupted_turn() {
        let turns = vec![
            Turn::user("hello"),
            Turn::assistant("Hi there, I can help"),
        ];

        let (index, tail) = resolve(&turns, "Hi there").unwrap();
        assert_eq!(index, 1);
        assert_eq!(tail, vec![Turn::assistant("Hi there")]);
    }

    #[test]
    fn test_no_match_is_none() {
        let turns = vec![
            Turn::user("hello"),
            Turn::assistant("Hi there, I can help"),
        ];
        assert!(resolve(&turns, "xyz").is_none());
    }

    #[test]
    fn test_empty_utterance_is_none() {
        let turns = vec![Turn::assistant("Hi there")];
        assert!(resolve(&turns, "").is_none());
    }

    #[test]
    fn test_reapplying_same_interrupt_is_stable() {
        let turns = vec![Turn::user("hello"), Turn::assistant("Hi there")];

        // Content is already exactly the heard prefix; resolution re-matches
        // and produces the identical turn.
        let (index, tail) = resolve(&turns, "Hi there").unwrap();
        assert_eq!(index, 1);
        assert_eq!(tail, vec![Turn::assistant("Hi there")]);
    }

    #[test]
    fn test_drops_later_assistant_turns_keeps_user_turns() {
        let turns = vec![
            Turn::user("hello"),
            Turn::assistant("Let me explain this in detail"),
            Turn::user("actually wait"),
            Turn::assistant("Sure, as I was saying"),
        ];

        let (index, tail) = resolve(&turns, "Let me explain").unwrap();
        assert_eq!(index, 1);
        assert_eq!(
            tail,
            vec![Turn::assistant("Let me explain"), Turn::user("actually wait")]
        );
    }

    #[test]
    fn test_matches_mid_turn_substring() {
        let turns = vec![Turn::assistant("Well. Hi there, I can help")];

        let (_, tail) = resolve(&turns, "Hi there").unwrap();
        assert_eq!(tail, vec![Turn::assistant("Well. Hi there")]);
    }

    #[test]
    fn test_first_assistant_match_wins() {
        let turns = vec![
            Turn::assistant("Hi there again"),
            Turn::assistant("Hi there once more"),
        ];

        let (index, tail) = resolve(&turns, "Hi there").unwrap();
        assert_eq!(index, 0);
        assert_eq!(tail, vec![Turn::assistant("Hi there")]);
    }

    #[test]
    fn test_user_turn_content_never_matches() {
        let turns = vec![Turn::user("Hi there, I can help")];
        assert!(resolve(&turns, "Hi there").is_none());
    }

    #[test]
    fn test_apply_persists_truncation() {
        let store = SessionStore::new();
        store.create("CA1");
        store.append("CA1", Turn::user("hello")).unwrap();
        store
            .append("CA1", Turn::assistant("Hi there, I can help"))
            .unwrap();

        assert!(apply(&store, "CA1", "Hi there").unwrap());
        assert_eq!(
            store.get("CA1").unwrap(),
            vec![Turn::user("hello"), Turn::assistant("Hi there")]
        );
    }

    #[test]
    fn test_apply_no_match_leaves_history_untouched() {
        let store = SessionStore::new();
        store.create("CA1");
        store.append("CA1", Turn::user("hello")).unwrap();
        store
            .append("CA1", Turn::assistant("Hi there, I can help"))
            .unwrap();

        assert!(!apply(&store, "CA1", "xyz").unwrap());
        assert_eq!(
            store.get("CA1").unwrap(),
            vec![Turn::user("hello"), Turn::assistant("Hi there, I can help")]
        );
    }

    #[test]
    fn test_apply_unknown_call_is_error() {
        let store = SessionStore::new();
        assert!(apply(&store, "CA404", "Hi there").is_err());
    }
}
