use crate::coordinator::UploadCoordinator;
use crate::settings::UploadSettings;
use crate::stats::UploadStats;
use crate::transport::Transport;
use crate::UploadError;

/// Public facade over one [`UploadCoordinator`].
///
/// ```no_run
/// # use webmup_uploader::{Uploader, UploadSettings, Transport};
/// # async fn example(transport: Box<dyn Transport>) -> Result<(), webmup_uploader::UploadError> {
/// let settings = UploadSettings::new("http://example.test/upload", "live.webm");
/// let mut uploader = Uploader::init(settings, transport)?;
/// uploader.run();
/// uploader.submit(b"first chunk")?;
/// while !uploader.is_complete() {
///     tokio::time::sleep(std::time::Duration::from_millis(20)).await;
/// }
/// uploader.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Uploader {
    coordinator: UploadCoordinator,
}

impl Uploader {
    /// See [`UploadCoordinator::init`].
    pub fn init(
        settings: UploadSettings,
        transport: Box<dyn Transport>,
    ) -> Result<Self, UploadError> {
        Ok(Self {
            coordinator: UploadCoordinator::init(settings, transport)?,
        })
    }

    /// See [`UploadCoordinator::run`].
    pub fn run(&mut self) {
        self.coordinator.run();
    }

    /// See [`UploadCoordinator::submit`].
    pub fn submit(&self, data: &[u8]) -> Result<(), UploadError> {
        self.coordinator.submit(data)
    }

    /// See [`UploadCoordinator::stats`].
    pub fn stats(&self) -> UploadStats {
        self.coordinator.stats()
    }

    /// See [`UploadCoordinator::is_complete`].
    pub fn is_complete(&self) -> bool {
        self.coordinator.is_complete()
    }

    /// See [`UploadCoordinator::stop`].
    pub async fn stop(&mut self) {
        self.coordinator.stop().await;
    }

    /// See [`UploadCoordinator::settings`].
    pub fn settings(&self) -> &UploadSettings {
        self.coordinator.settings()
    }
}
