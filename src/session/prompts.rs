//! Prompt templates for the retrieval-augmented conversation.
//!
//! Two calls reach the chat model per question: an optional condensation step
//! that rewrites a follow-up into a standalone question using the transcript,
//! and the answer step that sees only the retrieved excerpts plus the
//! standalone question. History never reaches the answer prompt directly.

use crate::chat::ChatMessage;
use crate::qdrant::RetrievedPassage;

use super::types::ChatTurn;

const CONDENSE_SYSTEM_PROMPT: &str = "Given a conversation and a follow-up question, rephrase the \
follow-up into a standalone question that can be understood without the conversation. Keep the \
question in its original language and reply with the standalone question only.";

const ANSWER_SYSTEM_PROMPT: &str = "You answer questions about a single uploaded PDF document. \
Use only the excerpts provided in the message. If the excerpts do not contain the answer, say \
you do not know instead of guessing. Keep answers concise.";

/// Build the condensation conversation for a follow-up question.
///
/// Only called when the transcript is non-empty; a first question needs no
/// rewriting.
pub(crate) fn condense_question_messages(
    history: &[ChatTurn],
    follow_up: &str,
) -> Vec<ChatMessage> {
    let request = format!(
        "Conversation so far:\n{}\nFollow-up question: {follow_up}\nStandalone question:",
        render_transcript(history)
    );
    vec![
        ChatMessage::system(CONDENSE_SYSTEM_PROMPT),
        ChatMessage::user(request),
    ]
}

/// Build the answer conversation from retrieved passages and the standalone
/// question.
pub(crate) fn answer_messages(
    passages: &[RetrievedPassage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut context = String::new();
    for passage in passages {
        context.push_str(&format!("[Page {}]\n{}\n\n", passage.page + 1, passage.text));
    }

    let request = format!("Excerpts from the document:\n\n{context}Question: {question}");
    vec![
        ChatMessage::system(ANSWER_SYSTEM_PROMPT),
        ChatMessage::user(request),
    ]
}

fn render_transcript(history: &[ChatTurn]) -> String {
    let mut transcript = String::new();
    for turn in history {
        transcript.push_str(&format!(
            "Human: {}\nAssistant: {}\n",
            turn.question, turn.answer
        ));
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;

    fn turn(question: &str, answer: &str) -> ChatTurn {
        ChatTurn {
            question: question.into(),
            answer: answer.into(),
            source_page: 1,
        }
    }

    #[test]
    fn condensation_includes_transcript_and_follow_up() {
        let history = vec![
            turn("What is the contract term?", "Three years."),
            turn("Who signs it?", "Both parties."),
        ];
        let messages = condense_question_messages(&history, "When does it start?");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].role, ChatRole::User);

        let request = &messages[1].content;
        assert!(request.contains("Human: What is the contract term?"));
        assert!(request.contains("Assistant: Three years."));
        assert!(request.contains("Human: Who signs it?"));
        assert!(request.contains("Follow-up question: When does it start?"));
        assert!(request.ends_with("Standalone question:"));
    }

    #[test]
    fn answer_prompt_labels_passages_with_one_based_pages() {
        let passages = vec![
            RetrievedPassage {
                page: 4,
                text: "The term is three years.".into(),
            },
            RetrievedPassage {
                page: 7,
                text: "Renewal is automatic.".into(),
            },
        ];
        let messages = answer_messages(&passages, "What is the term?");

        assert_eq!(messages.len(), 2);
        let request = &messages[1].content;
        assert!(request.contains("[Page 5]\nThe term is three years."));
        assert!(request.contains("[Page 8]\nRenewal is automatic."));
        assert!(request.ends_with("Question: What is the term?"));
    }

    #[test]
    fn answer_prompt_never_carries_history() {
        let passages = vec![RetrievedPassage {
            page: 0,
            text: "Some context.".into(),
        }];
        let messages = answer_messages(&passages, "Standalone?");
        assert!(messages.iter().all(|m| m.role != ChatRole::Assistant));
    }
}
