//! RAG assistants - general agriculture chatbot and government scheme helper
//!
//! Each turn: retrieve context for the message, render one prompt with the
//! whole session history, call the LLM, append the answer verbatim.
//! History lives only as long as the session and is never truncated.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::i18n::Language;
use crate::knowledge::{join_context, ContextSource};
use crate::llm::ChatModel;

// ============================================================================
// Assistant Kind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantKind {
    /// Crops, soil and plant diseases
    General,
    /// Government schemes only
    Schemes,
}

impl AssistantKind {
    pub fn role(self) -> &'static str {
        match self {
            AssistantKind::General => {
                "AI assistant for agriculture. Answer questions about crops, soil, and plant diseases."
            }
            AssistantKind::Schemes => {
                "AI assistant for agriculture schemes. Answer only scheme-related queries."
            }
        }
    }
}

// ============================================================================
// Conversation
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    Ai(String),
}

impl Turn {
    /// `User: ...` / `AI: ...`
    pub fn render(&self) -> String {
        match self {
            Turn::User(text) => format!("User: {}", text),
            Turn::Ai(text) => format!("AI: {}", text),
        }
    }
}

/// Session-scoped chat history
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Rendered turns joined by newlines
    pub fn history(&self) -> String {
        self.turns
            .iter()
            .map(Turn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

// ============================================================================
// Prompt
// ============================================================================

pub struct PromptParts<'a> {
    pub role: &'a str,
    pub language_instruction: &'a str,
    pub session_history: &'a str,
    pub retrieved_context: &'a str,
    pub user_input: &'a str,
}

pub fn render_prompt(parts: &PromptParts<'_>) -> String {
    format!(
        "Role: {}\n{}\nSession History:\n{}\nContext:\n{}\nUser: {}\nAI:",
        parts.role,
        parts.language_instruction,
        parts.session_history,
        parts.retrieved_context,
        parts.user_input
    )
}

// ============================================================================
// AssistantSession
// ============================================================================

pub struct AssistantSession {
    kind: AssistantKind,
    context: Arc<dyn ContextSource>,
    model: Arc<dyn ChatModel>,
    conversation: Conversation,
}

impl AssistantSession {
    pub fn new(kind: AssistantKind, context: Arc<dyn ContextSource>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            kind,
            context,
            model,
            conversation: Conversation::new(),
        }
    }

    pub fn kind(&self) -> AssistantKind {
        self.kind
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Start over; the next prompt carries no history
    pub fn clear_history(&mut self) {
        tracing::debug!("Clearing {:?} history ({} turns)", self.kind, self.conversation.len());
        self.conversation.clear();
    }

    /// One chat turn. Blank input is ignored and returns `None`.
    ///
    /// The user line stays in history even if retrieval or generation
    /// fails.
    pub async fn ask(&mut self, input: &str, language: Language) -> Result<Option<String>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        self.conversation.push(Turn::User(input.to_string()));

        let chunks = self
            .context
            .retrieve(input)
            .await
            .context("Failed to retrieve context")?;
        let retrieved_context = join_context(&chunks);

        let session_history = self.conversation.history();
        let prompt = render_prompt(&PromptParts {
            role: self.kind.role(),
            language_instruction: language.answer_instruction(),
            session_history: &session_history,
            retrieved_context: &retrieved_context,
            user_input: input,
        });

        let response = self
            .model
            .complete(&prompt)
            .await
            .context("Failed to generate response")?;

        tracing::info!(
            "{:?} assistant answered ({} context chunks, {} turns)",
            self.kind,
            chunks.len(),
            self.conversation.len() + 1
        );

        self.conversation.push(Turn::Ai(response.clone()));
        Ok(Some(response))
    }
}

// ============================================================================
// Tests
// ============================================================================
