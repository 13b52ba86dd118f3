//! Text recognition behind an explicit handle.
//!
//! OCR workers are expensive to start, so the handle initializes its
//! recognizer on first use and keeps it until [`RecognizerHandle::release`]
//! is called. Callers own the lifecycle; there is no process-global
//! recognizer state.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::ExtractionError;

/// Turns a scanned document into plain text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(&self, image: &Path) -> Result<String, ExtractionError>;
}

/// [`TextRecognizer`] shelling out to the `tesseract` binary.
pub struct TesseractRecognizer {
    language: String,
}

impl TesseractRecognizer {
    /// `language` is a tesseract language spec such as `"por"` or
    /// `"por+eng"`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize_text(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Recognizer(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

enum RecognizerSource {
    Tesseract { language: String },
    Custom(Arc<dyn TextRecognizer>),
}

/// Lazily initialized recognizer with an explicit lifecycle.
pub struct RecognizerHandle {
    source: RecognizerSource,
    worker: Mutex<Option<Arc<dyn TextRecognizer>>>,
}

impl RecognizerHandle {
    /// Handle that starts a [`TesseractRecognizer`] on first use.
    pub fn tesseract(language: impl Into<String>) -> Self {
        Self {
            source: RecognizerSource::Tesseract {
                language: language.into(),
            },
            worker: Mutex::new(None),
        }
    }

    /// Handle over a caller-provided recognizer.
    pub fn with_recognizer(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            source: RecognizerSource::Custom(recognizer),
            worker: Mutex::new(None),
        }
    }

    /// Returns the recognizer, initializing it on first call.
    pub async fn acquire(&self) -> Arc<dyn TextRecognizer> {
        let mut worker = self.worker.lock().await;
        if let Some(recognizer) = worker.as_ref() {
            return Arc::clone(recognizer);
        }

        let recognizer: Arc<dyn TextRecognizer> = match &self.source {
            RecognizerSource::Tesseract { language } => {
                tracing::debug!(language, "starting tesseract recognizer");
                Arc::new(TesseractRecognizer::new(language.clone()))
            }
            RecognizerSource::Custom(recognizer) => Arc::clone(recognizer),
        };
        *worker = Some(Arc::clone(&recognizer));
        recognizer
    }

    /// Drops the current recognizer. The next [`RecognizerHandle::acquire`]
    /// initializes a fresh one.
    pub async fn release(&self) {
        let mut worker = self.worker.lock().await;
        *worker = None;
    }
}
