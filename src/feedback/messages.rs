//! Fixed assistant messages: welcome, no-diff prompt, all clear, notices.

use crate::constants::SYSTEM_SENDER;
use crate::models::{Message, MessageAction, Subtlety, now_timestamp};

/// Label of the "review the whole file instead" action.
pub const WHOLE_FILE_ACTION_LABEL: &str = "Yes, do it";

/// Greeting the conversation starts with. Sent by the system sender, so
/// it never counts as an analysis run.
pub fn welcome() -> Message {
    Message::assistant(
        now_timestamp(),
        SYSTEM_SENDER,
        "Good morning. Sidecoach online and ready for a coding session. \
         Save a file or send me a diff, and I'll keep the feedback sharp and actionable.",
    )
}

/// Offer a whole-file review when a diff was required but empty.
pub fn no_diff_prompt(file_name: &str, subtlety: Subtlety) -> Message {
    let content = match subtlety {
        Subtlety::Gentle => {
            "I don't see any changes in this file yet. Want me to review the whole file anyway?"
        }
        Subtlety::Direct => {
            "No diff detected for this file. Do you want me to analyze the whole file instead?"
        }
        Subtlety::Strict => {
            "No changes detected in this file. Should I run a full-file analysis now?"
        }
    };
    Message {
        action: Some(MessageAction::AnalyzeWholeFile {
            label: WHOLE_FILE_ACTION_LABEL.to_string(),
            file_name: file_name.to_string(),
        }),
        ..Message::assistant(now_timestamp(), file_name, content)
    }
}

/// Reported when the model finds nothing worth raising.
pub fn all_clear(file_name: &str, subtlety: Subtlety) -> Message {
    let content = match subtlety {
        Subtlety::Gentle => "Looks good to me. Nothing here needs your attention right now.",
        Subtlety::Direct => "All clear. No high-impact issues in this change.",
        Subtlety::Strict => "No high-impact issues found. Keep the bar this high.",
    };
    Message::assistant(now_timestamp(), file_name, content)
}

/// A note from the system sender, such as a failed follow-up. Like the
/// welcome message it never anchors a follow-up.
pub fn notice(text: impl Into<String>) -> Message {
    Message::assistant(now_timestamp(), SYSTEM_SENDER, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn welcome_comes_from_system_sender() {
        let msg = welcome();
        assert_eq!(msg.file_name, SYSTEM_SENDER);
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.action.is_none());
    }

    #[test]
    fn no_diff_prompt_wording_follows_subtlety() {
        let gentle = no_diff_prompt("a.js", Subtlety::Gentle);
        let direct = no_diff_prompt("a.js", Subtlety::Direct);
        let strict = no_diff_prompt("a.js", Subtlety::Strict);
        assert!(gentle.content.starts_with("I don't see any changes"));
        assert!(direct.content.starts_with("No diff detected"));
        assert!(strict.content.contains("full-file analysis"));
    }

    #[test]
    fn no_diff_prompt_offers_whole_file_action() {
        let msg = no_diff_prompt("/repo/a.js", Subtlety::Direct);
        assert_eq!(msg.file_name, "/repo/a.js");
        assert_eq!(
            msg.action,
            Some(MessageAction::AnalyzeWholeFile {
                label: "Yes, do it".to_string(),
                file_name: "/repo/a.js".to_string(),
            })
        );
    }

    #[test]
    fn all_clear_has_no_fix_section() {
        for subtlety in [Subtlety::Gentle, Subtlety::Direct, Subtlety::Strict] {
            let msg = all_clear("a.js", subtlety);
            assert!(!msg.content.contains("Fix:"));
            assert_eq!(msg.file_name, "a.js");
        }
    }

    #[test]
    fn notice_comes_from_system_sender() {
        let msg = notice("Follow-up failed: boom");
        assert_eq!(msg.file_name, SYSTEM_SENDER);
        assert_eq!(msg.content, "Follow-up failed: boom");
        assert!(msg.action.is_none());
    }
}
