use crate::models::{ChatMessage, ChatRole};

const SHORT_QUERY_TOKENS: usize = 5;
const FOLLOW_UP_MARKERS: [&str; 2] = ["more", "elaborat"];

/// Rewrites a follow-up question into a standalone search string by
/// prefixing the most recent user turn.
pub fn reformulate_query(user_query: &str, history: &[ChatMessage]) -> String {
    if history.is_empty() || !needs_context(user_query) {
        return user_query.to_string();
    }

    match history
        .iter()
        .rev()
        .find(|message| message.role == ChatRole::User)
    {
        Some(previous) if !previous.content.is_empty() => {
            format!("{} {}", previous.content, user_query)
        }
        _ => user_query.to_string(),
    }
}

pub fn needs_context(user_query: &str) -> bool {
    if user_query.split_whitespace().count() < SHORT_QUERY_TOKENS {
        return true;
    }

    let lowered = user_query.to_lowercase();
    FOLLOW_UP_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::{needs_context, reformulate_query};
    use crate::models::{ChatMessage, ChatRole};

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("tell me about X"),
            ChatMessage::assistant("X is a managed service."),
        ]
    }

    #[test]
    fn empty_history_returns_query_unchanged() {
        assert_eq!(reformulate_query("tell me more", &[]), "tell me more");
    }

    #[test]
    fn follow_up_is_prefixed_with_last_user_turn() {
        assert_eq!(
            reformulate_query("tell me more", &history()),
            "tell me about X tell me more"
        );
    }

    #[test]
    fn long_standalone_query_ignores_history() {
        let query = "what is the capital of France and why";
        assert_eq!(reformulate_query(query, &history()), query);
    }

    #[test]
    fn markers_match_case_insensitively_inside_long_queries() {
        assert!(needs_context("Could you please ELABORATE on the pricing tiers"));
        assert!(needs_context("I would like to know MORE about the pricing tiers"));
        assert!(!needs_context("which regions support the pricing tiers today"));
    }

    #[test]
    fn most_recent_user_turn_wins() {
        let history = vec![
            ChatMessage::user("first question"),
            ChatMessage::assistant("first answer"),
            ChatMessage::user("second question"),
            ChatMessage::assistant("second answer"),
        ];
        assert_eq!(reformulate_query("why", &history), "second question why");
    }

    #[test]
    fn history_without_user_turns_leaves_query_alone() {
        let history = vec![
            ChatMessage {
                role: ChatRole::System,
                content: "be concise".to_string(),
            },
            ChatMessage::assistant("hello"),
        ];
        assert_eq!(reformulate_query("more please", &history), "more please");
    }

    #[test]
    fn empty_last_user_turn_leaves_query_alone() {
        let history = vec![ChatMessage::user("tell me about X"), ChatMessage::user("")];
        assert_eq!(reformulate_query("tell me more", &history), "tell me more");
    }
}
