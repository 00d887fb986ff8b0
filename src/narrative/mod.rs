//! Narrative generation
//!
//! Builds financial-advisor prompts from the structured allocation and
//! profile inputs and delegates to a text-completion collaborator. The
//! collaborator is abstract: any backend that can turn an ordered list
//! of chat messages into one completion works here.

pub mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Allocation, Narrative, RiskTier};
use crate::Result;

//
// ================= Completion Contract =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Text-completion collaborator: one request, one synchronous response,
/// first choice consumed. Both reference backends (OpenRouter and a
/// managed chat-completion service) satisfy this contract.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn submit_prompt(&self, messages: &[ChatMessage]) -> Result<String>;
}

//
// ================= Narrative Generator =================
//

/// Builds prompts and turns completions into narratives.
pub struct NarrativeGenerator {
    provider: Box<dyn CompletionProvider>,
}

impl NarrativeGenerator {
    pub fn new(provider: Box<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Explain a freshly computed allocation for the user's profile.
    pub async fn explain(
        &self,
        allocation: &Allocation,
        age: u8,
        risk: RiskTier,
        goal: &str,
    ) -> Result<Narrative> {
        let prompt = format!(
            "Act like a professional financial advisor. Explain this portfolio \
             allocation for a {}-year-old user with {} risk tolerance and goal: {}. \
             The allocation is: Equity: {}%, Debt: {}%, Gold: {}%.",
            age, risk, goal, allocation.equity, allocation.debt, allocation.gold
        );

        let messages = [
            ChatMessage::system("You are a helpful financial advisor."),
            ChatMessage::user(prompt),
        ];

        info!(age, risk = %risk, "Requesting allocation explanation");
        let text = self.provider.submit_prompt(&messages).await?;
        Ok(Narrative::new(text))
    }

    /// Answer a free-form question about an existing allocation.
    pub async fn answer(
        &self,
        allocation: &Allocation,
        age: u8,
        goal: &str,
        question: &str,
    ) -> Result<Narrative> {
        let prompt = format!(
            "The user has a portfolio: Equity: {}%, Debt: {}%, Gold: {}%, \
             age {}, goal: {}. Question: {}",
            allocation.equity, allocation.debt, allocation.gold, age, goal, question
        );

        let messages = [
            ChatMessage::system("You are a financial advisor."),
            ChatMessage::user(prompt),
        ];

        info!(age, "Requesting portfolio answer");
        let text = self.provider.submit_prompt(&messages).await?;
        Ok(Narrative::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use std::sync::{Arc, Mutex};

    /// Records the submitted messages and replies with canned text.
    struct RecordingProvider {
        seen: Arc<Mutex<Vec<ChatMessage>>>,
        reply: String,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> (Self, Arc<Mutex<Vec<ChatMessage>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    seen: seen.clone(),
                    reply: reply.to_string(),
                },
                seen,
            )
        }
    }

    #[async_trait]
    impl CompletionProvider for RecordingProvider {
        async fn submit_prompt(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_explain_embeds_structured_inputs() {
        let (provider, seen) = RecordingProvider::new("A balanced mix.");
        let generator = NarrativeGenerator::new(Box::new(provider));

        let allocation = allocate(RiskTier::Medium);
        let narrative = generator
            .explain(&allocation, 30, RiskTier::Medium, "retirement")
            .await
            .unwrap();

        assert_eq!(narrative.text, "A balanced mix.");

        let messages = seen.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        let prompt = &messages[1].content;
        assert!(prompt.contains("Equity: 50%"));
        assert!(prompt.contains("Debt: 40%"));
        assert!(prompt.contains("Gold: 10%"));
        assert!(prompt.contains("30-year-old"));
        assert!(prompt.contains("Medium risk tolerance"));
        assert!(prompt.contains("retirement"));
    }

    #[tokio::test]
    async fn test_answer_embeds_question_verbatim() {
        let (provider, seen) = RecordingProvider::new("Yes.");
        let generator = NarrativeGenerator::new(Box::new(provider));

        let allocation = allocate(RiskTier::High);
        generator
            .answer(&allocation, 45, "house", "Should I rebalance quarterly?")
            .await
            .unwrap();

        let messages = seen.lock().unwrap();
        let prompt = &messages[1].content;
        assert!(prompt.contains("Equity: 70%"));
        assert!(prompt.contains("age 45"));
        assert!(prompt.contains("goal: house"));
        assert!(prompt.contains("Question: Should I rebalance quarterly?"));
    }
}
