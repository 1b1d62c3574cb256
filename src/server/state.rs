use std::sync::Arc;

use tokio::sync::Mutex;

use crate::services::{FeedbackLog, QaPipeline};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<QaPipeline>,
    feedback: Arc<Mutex<FeedbackLog>>,
}

impl AppState {
    pub fn new(pipeline: QaPipeline, feedback: FeedbackLog) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            feedback: Arc::new(Mutex::new(feedback)),
        }
    }

    pub fn pipeline(&self) -> &QaPipeline {
        &self.pipeline
    }

    /// Feedback appends go through this lock one at a time.
    pub fn feedback(&self) -> &Mutex<FeedbackLog> {
        &self.feedback
    }
}
