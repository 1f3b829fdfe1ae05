// ============================
// huddle-backend-lib/src/ai.rs
// ============================
//! Boundary to the external answer-producing collaborator.
use async_trait::async_trait;

/// Contract with the answer collaborator: given a question and the room
/// transcript rendered as context lines, produce an answer string.
///
/// Implementations absorb their own failures; the returned string may be a
/// fallback, but the call itself never errors. Answer computation lives
/// entirely behind this trait.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> String;
}

/// Stand-in used when no external answer service is wired up.
pub struct FallbackAnswerer {
    reply: String,
}

impl FallbackAnswerer {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for FallbackAnswerer {
    fn default() -> Self {
        Self::new("The answer service is not available right now.")
    }
}

#[async_trait]
impl AnswerProvider for FallbackAnswerer {
    async fn answer(&self, _question: &str, _context: &str) -> String {
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_always_returns_its_reply() {
        let answerer = FallbackAnswerer::new("try again later");
        assert_eq!(answerer.answer("what?", "").await, "try again later");
        assert_eq!(
            answerer.answer("", "Alice: hello").await,
            "try again later"
        );
    }
}
