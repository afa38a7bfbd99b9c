use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{GenerateError, Generation, Generator};

/// What a scripted call should produce.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// The service answered without usable text.
    Empty,
    /// The service answered with an error status.
    Api { status: u16, body: String },
}

/// A scripted generator for tests. Returns pre-defined replies in order and
/// records every prompt it was given.
pub struct MockGenerator {
    replies: Vec<Reply>,
    index: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(vec![Reply::Text(text.to_string())])
    }

    /// Number of times `generate` was called.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// `(system, user)` pairs, oldest first.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<Generation, GenerateError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.get(i).ok_or_else(|| {
            GenerateError::Unavailable(format!(
                "MockGenerator: no more replies (called {} times)",
                i + 1
            ))
        })?;
        match reply {
            Reply::Text(text) => Ok(Generation {
                text: text.clone(),
                model: "mock".to_string(),
                usage: None,
            }),
            Reply::Empty => Err(GenerateError::EmptyResponse),
            Reply::Api { status, body } => Err(GenerateError::Api {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_prompts_in_order() {
        let mock = MockGenerator::new(vec![Reply::Text("a".into()), Reply::Empty]);
        mock.generate("sys", "first").await.unwrap();
        assert!(matches!(
            mock.generate("sys", "second").await,
            Err(GenerateError::EmptyResponse)
        ));

        assert_eq!(mock.calls(), 2);
        assert_eq!(
            mock.prompts(),
            vec![
                ("sys".to_string(), "first".to_string()),
                ("sys".to_string(), "second".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn exhausted_script_fails() {
        let mock = MockGenerator::new(vec![]);
        assert!(mock.generate("s", "u").await.is_err());
        assert_eq!(mock.prompts().len(), 1);
    }
}
