//! Fixtures and in-memory doubles shared by the unit tests.

use crate::{
    config::ObjectStoreConfig,
    error::{GenImageError, Result},
    gemini::ContentGenerator,
    models::{ContentPart, ImageAsset, Slot},
    storage::{ArtifactWriter, ObjectStoreConnector},
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) fn sample_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 31 % 256) as u8, (y * 17 % 256) as u8, ((x + y) * 7 % 256) as u8])
    }))
}

pub(crate) fn encoded_sample(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    sample_image(width, height)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

pub(crate) fn asset(slot: u8) -> ImageAsset {
    ImageAsset::new(Slot::new(slot).unwrap(), sample_image(4, 4))
}

/// Answers every call with the same parts (or the same error) and records
/// what it was sent.
pub(crate) struct ScriptedGenerator {
    reply: std::result::Result<Vec<ContentPart>, String>,
    requests: Mutex<Vec<(String, Vec<ContentPart>)>>,
}

impl ScriptedGenerator {
    pub(crate) fn replying(parts: Vec<ContentPart>) -> Self {
        Self {
            reply: Ok(parts),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<(String, Vec<ContentPart>)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<ContentPart>,
    ) -> Result<Vec<ContentPart>> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), parts));
        self.reply
            .clone()
            .map_err(GenImageError::UpstreamError)
    }
}

/// Object-store stand-in that keeps uploads in memory.
pub(crate) struct MemoryWriter {
    fail: bool,
    attempts: AtomicUsize,
    writes: Mutex<Vec<(String, Vec<u8>, String)>>,
}

impl MemoryWriter {
    pub(crate) fn new() -> Self {
        Self {
            fail: false,
            attempts: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn last_write(&self) -> Option<(String, Vec<u8>, String)> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ArtifactWriter for MemoryWriter {
    async fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenImageError::ObjectStoreWriteError(
                "connection refused".into(),
            ));
        }
        self.writes.lock().unwrap().push((
            key.to_string(),
            bytes.to_vec(),
            content_type.to_string(),
        ));
        Ok(key.to_string())
    }

    fn describe(&self) -> String {
        "bucket memory".to_string()
    }
}

pub(crate) struct ScriptedConnector {
    succeed: bool,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    pub(crate) fn succeeding() -> Self {
        Self {
            succeed: true,
            attempts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            succeed: false,
            attempts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStoreConnector for ScriptedConnector {
    async fn connect(&self, _config: &ObjectStoreConfig) -> Result<Arc<dyn ArtifactWriter>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(Arc::new(MemoryWriter::new()))
        } else {
            Err(GenImageError::ObjectStoreInitError(
                "bucket check failed: access denied".into(),
            ))
        }
    }
}
