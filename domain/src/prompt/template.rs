//! Prompt templates for the council flow

use crate::council::value_objects::StageOneResult;
use crate::session::entities::Message;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Content of the user turn sent to every roster member in Stage 1.
    ///
    /// Without context this is the raw query. With context the query is
    /// prefixed by the reference block, a blank line and `Question: `.
    pub fn stage1_user_turn(query: &str, context: &str) -> String {
        if context.is_empty() {
            return query.to_string();
        }
        format!("Reference Documents:\n{}\n\nQuestion: {}", context, query)
    }

    /// Outbound message sequence for Stage 1: history followed by the new turn.
    pub fn stage1_messages(query: &str, history: &[Message], context: &str) -> Vec<Message> {
        let mut messages = history.to_vec();
        messages.push(Message::user(Self::stage1_user_turn(query, context)));
        messages
    }

    /// Render prior turns as `User: ...` / `Assistant: ...` lines.
    pub fn format_history(history: &[Message]) -> String {
        history
            .iter()
            .map(|m| format!("{}: {}\n", m.role.speaker(), m.content))
            .collect()
    }

    /// Render Stage 1 answers as `Model: <id>\nResponse: <text>` blocks.
    pub fn format_stage1(results: &[StageOneResult]) -> String {
        results
            .iter()
            .map(|r| format!("Model: {}\nResponse: {}", r.model, r.response))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Prompt given to the chairman in Stage 3.
    pub fn chairman_prompt(
        query: &str,
        results: &[StageOneResult],
        history: &[Message],
        context: &str,
    ) -> String {
        let rag_text = if context.is_empty() {
            String::new()
        } else {
            format!("\n\nReference Documents:\n{}\n", context)
        };

        let history_text = if history.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nConversation Context:\n{}\n",
                Self::format_history(history)
            )
        };

        format!(
            r#"You are the Chairman of an LLM Council. Multiple AI models have provided responses to a user's question.

{rag_text}
{history_text}Original Question: {query}

STAGE 1 - Individual Responses:
{stage1_text}

Your task as Chairman is to synthesize all of this information into a single, comprehensive, accurate answer to the user's original question. Consider:
- The individual responses and their insights
- Any patterns of agreement or disagreement

Provide a clear, well-reasoned final answer that represents the council's collective wisdom:"#,
            stage1_text = Self::format_stage1(results),
        )
    }

    /// Prompt asking a fast model for a short conversation title.
    pub fn title_prompt(query: &str) -> String {
        format!(
            r#"Generate a very short title (3-5 words maximum) that summarizes the following question.
The title should be concise and descriptive. Do not use quotes or punctuation in the title.

Question: {}

Title:"#,
            query
        )
    }
}
