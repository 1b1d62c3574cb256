//! Question answering: retrieval, prompting and source parsing.

use std::sync::Arc;

use super::generation::Generator;
use super::prompt::{build_prompt, parse_answer};
use super::retrieval::{Retriever, retrieve_cited};
use crate::error::QaError;
use crate::models::Answer;

pub struct QaPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl QaPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>, top_k: usize) -> Self {
        Self {
            retriever,
            generator,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer one question from the stored documents. Each call is independent.
    pub async fn ask(&self, question: &str) -> Result<Answer, QaError> {
        let question = question.trim();
        let chunks = retrieve_cited(self.retriever.as_ref(), question, self.top_k).await?;
        tracing::info!("Answering with {} retrieved chunks", chunks.len());

        let prompt = build_prompt(question, &chunks);
        let reply = self.generator.generate(&prompt).await?;
        let (answer, sources) = parse_answer(&reply);

        Ok(Answer::new(question, answer, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, SearchError};
    use crate::models::{Metadata, RetrievedChunk};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct OneChunk;

    #[async_trait]
    impl Retriever for OneChunk {
        async fn search(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<RetrievedChunk>, SearchError> {
            let mut metadata = Metadata::new();
            metadata.insert("filename".into(), "quality_audit.pdf".into());
            Ok(vec![RetrievedChunk {
                id: "1".to_string(),
                content: "Audits are held every quarter.".to_string(),
                score: 0.9,
                metadata,
            }])
        }
    }

    /// Records the prompt and replies with a fixed text.
    struct Scripted {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_ask_returns_answer_and_sources() {
        let generator = Arc::new(Scripted::new(
            "Every quarter.\nSOURCES: quality_audit.pdf",
        ));
        let pipeline = QaPipeline::new(Arc::new(OneChunk), generator.clone(), 5);

        let answer = pipeline.ask("  How often are audits held? ").await.unwrap();
        assert_eq!(answer.question, "How often are audits held?");
        assert_eq!(answer.answer, "Every quarter.");
        assert_eq!(answer.sources, vec!["quality_audit.pdf"]);
        assert_eq!(answer.trust_score(), 24);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Source: quality_audit.pdf"));
    }

    #[tokio::test]
    async fn test_ask_without_sources_marker() {
        let generator = Arc::new(Scripted::new("I don't know."));
        let pipeline = QaPipeline::new(Arc::new(OneChunk), generator, 5);

        let answer = pipeline.ask("Unrelated?").await.unwrap();
        assert_eq!(answer.answer, "I don't know.");
        assert!(answer.sources.is_empty());
    }
}
