use crate::{
    error::Result,
    gemini::GenerationClient,
    intake::ImageIntake,
    models::{EncodedImage, GenerationOptions, GenerationResult, PersistOptions, PersistOutcome},
    storage::{ResultPersister, StorageBackend},
};
use std::sync::Arc;
use uuid::Uuid;

/// What one generate action produced.
#[derive(Debug)]
pub struct GenerationReport {
    pub commentary: Option<String>,
    pub input_count: usize,
    /// One entry per returned image, in response order.
    pub persisted: Vec<Result<PersistOutcome>>,
}

impl GenerationReport {
    pub fn stored_count(&self) -> usize {
        self.persisted
            .iter()
            .filter(|outcome| matches!(outcome, Ok(PersistOutcome::Stored(_))))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &crate::error::GenImageError> {
        self.persisted.iter().filter_map(|outcome| outcome.as_ref().err())
    }
}

/// State private to one interactive session: uploads, the last result and
/// the bytes offered for download.
pub struct Session {
    id: Uuid,
    pub intake: ImageIntake,
    client: GenerationClient,
    persister: ResultPersister,
    backend: Arc<StorageBackend>,
    last_result: Option<GenerationResult>,
    last_download: Option<EncodedImage>,
}

impl Session {
    pub fn new(client: GenerationClient, backend: Arc<StorageBackend>) -> Self {
        Self {
            id: Uuid::new_v4(),
            intake: ImageIntake::new(),
            client,
            persister: ResultPersister::new(),
            backend,
            last_result: None,
            last_download: None,
        }
    }

    pub fn with_persister(mut self, persister: ResultPersister) -> Self {
        self.persister = persister;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    pub fn last_result(&self) -> Option<&GenerationResult> {
        self.last_result.as_ref()
    }

    /// Bytes of the most recent generated image, available even when the
    /// backend write failed.
    pub fn last_download(&self) -> Option<&EncodedImage> {
        self.last_download.as_ref()
    }

    pub fn last_filename(&self) -> Option<&str> {
        self.last_download.as_ref().map(|encoded| encoded.key.as_str())
    }

    /// Validates, calls the model once, then runs every returned image
    /// through the backend. The latest image becomes the download.
    pub async fn generate(
        &mut self,
        prompt: &str,
        options: &GenerationOptions,
        persist_options: &PersistOptions,
    ) -> Result<GenerationReport> {
        let images = self.intake.request_images()?;
        log::info!(
            "Session {}: generating from {} input image(s) with {}",
            self.id,
            images.len(),
            options.model
        );

        let result = self.client.generate(prompt, &images, options).await?;

        let mut persisted = Vec::with_capacity(result.images.len());
        for encoded in self.persister.encode_all(&result.images, persist_options) {
            let encoded = match encoded {
                Ok(encoded) => encoded,
                Err(e) => {
                    persisted.push(Err(e));
                    continue;
                }
            };
            let outcome = self.persister.store(&encoded, &self.backend).await;
            self.last_download = Some(encoded);
            persisted.push(outcome);
        }

        let report = GenerationReport {
            commentary: result.text.clone(),
            input_count: images.len(),
            persisted,
        };
        self.last_result = Some(result);
        Ok(report)
    }

    /// Drops uploads and results; the session can be reused afterwards.
    pub fn reset(&mut self) {
        self.intake.reset();
        self.last_result = None;
        self.last_download = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenImageError;
    use crate::models::{ContentPart, ImageModel, Slot};
    use crate::testing::{encoded_sample, ScriptedGenerator};
    use image::ImageFormat;

    fn session_with(generator: Arc<ScriptedGenerator>, backend: StorageBackend) -> Session {
        Session::new(GenerationClient::new(generator), Arc::new(backend))
    }

    fn flash() -> GenerationOptions {
        GenerationOptions::new(ImageModel::FlashImagePreview)
    }

    fn image_reply() -> Vec<ContentPart> {
        vec![
            ContentPart::text("Here is your sunset"),
            ContentPart::image("image/png", encoded_sample(ImageFormat::Png, 8, 8)),
        ]
    }

    #[tokio::test]
    async fn test_missing_first_image_makes_no_call() {
        let generator = Arc::new(ScriptedGenerator::replying(image_reply()));
        let mut session = session_with(generator.clone(), StorageBackend::ephemeral());
        session
            .intake
            .upload(Slot::new(2).unwrap(), &encoded_sample(ImageFormat::Png, 4, 4))
            .unwrap();

        let err = session
            .generate("merge into sunset scene", &flash(), &PersistOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenImageError::ValidationError(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_ephemeral_session_offers_download_only() {
        let generator = Arc::new(ScriptedGenerator::replying(image_reply()));
        let mut session = session_with(generator.clone(), StorageBackend::ephemeral());
        session
            .intake
            .upload(Slot::FIRST, &encoded_sample(ImageFormat::Png, 4, 4))
            .unwrap();

        let report = session
            .generate("merge into sunset scene", &flash(), &PersistOptions::new())
            .await
            .unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(report.input_count, 1);
        assert_eq!(report.commentary.as_deref(), Some("Here is your sunset"));
        assert_eq!(report.stored_count(), 0);
        assert!(matches!(
            report.persisted.as_slice(),
            [Ok(PersistOutcome::DownloadOnly(_))]
        ));
        assert!(session.last_download().is_some());
        assert!(session
            .last_filename()
            .unwrap()
            .starts_with("gemini_image_"));
    }

    #[tokio::test]
    async fn test_every_image_is_persisted_latest_is_exposed() {
        let reply = vec![
            ContentPart::image("image/png", encoded_sample(ImageFormat::Png, 3, 3)),
            ContentPart::image("image/png", encoded_sample(ImageFormat::Png, 7, 7)),
        ];
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::replying(reply));
        let mut session = session_with(generator, StorageBackend::filesystem(dir.path()));
        session
            .intake
            .upload(Slot::FIRST, &encoded_sample(ImageFormat::Png, 4, 4))
            .unwrap();

        let report = session
            .generate("two takes", &flash(), &PersistOptions::new())
            .await
            .unwrap();

        assert_eq!(report.persisted.len(), 2);
        assert_eq!(report.stored_count(), 2);
        let on_disk = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(on_disk, report.stored_count());

        let locations: Vec<&str> = report
            .persisted
            .iter()
            .filter_map(|outcome| match outcome {
                Ok(PersistOutcome::Stored(artifact)) => Some(artifact.location.as_str()),
                _ => None,
            })
            .collect();
        assert_ne!(locations[0], locations[1]);
        assert!(locations[1].ends_with("_2.png"));

        assert_eq!(session.last_result().unwrap().latest_image().unwrap().width(), 7);
        assert!(session.last_filename().unwrap().ends_with("_2.png"));
    }

    #[tokio::test]
    async fn test_failed_write_still_leaves_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2020-01-01"), b"x").unwrap();
        let generator = Arc::new(ScriptedGenerator::replying(image_reply()));
        let mut session = session_with(generator, StorageBackend::filesystem(dir.path()))
            .with_persister(ResultPersister::new().with_clock(|| {
                chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            }));
        session
            .intake
            .upload(Slot::FIRST, &encoded_sample(ImageFormat::Png, 4, 4))
            .unwrap();

        let report = session
            .generate(
                "merge into sunset scene",
                &flash(),
                &PersistOptions::new().with_date_folder(true),
            )
            .await
            .unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], GenImageError::FilesystemWriteError(_)));
        assert_eq!(
            session.last_filename(),
            Some("2020-01-01/gemini_image_20200101_000000.png")
        );
        assert!(!session.last_download().unwrap().bytes.is_empty());
    }

    #[tokio::test]
    async fn test_no_image_keeps_previous_state_and_reset_clears() {
        let generator = Arc::new(ScriptedGenerator::replying(vec![ContentPart::text(
            "Sorry, I can only describe it",
        )]));
        let mut session = session_with(generator, StorageBackend::ephemeral());
        session
            .intake
            .upload(Slot::FIRST, &encoded_sample(ImageFormat::Png, 4, 4))
            .unwrap();

        let err = session
            .generate("a cat", &flash(), &PersistOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenImageError::NoImageProduced));
        assert!(session.last_result().is_none());

        session.reset();
        assert!(session.intake.is_empty());
        assert!(session.last_download().is_none());
    }
}
