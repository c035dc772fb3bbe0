//! Mock image prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{ImageProber, ImageSize, SourceError};

/// Size reported for images without a registered size: a portrait cover
/// large enough to pass screening.
pub const DEFAULT_IMAGE_SIZE: ImageSize = ImageSize {
    width: 800,
    height: 1200,
};

/// Mock implementation of the ImageProber trait.
#[derive(Debug, Default)]
pub struct MockImageProber {
    sizes: Arc<RwLock<HashMap<String, ImageSize>>>,
    probed: Arc<RwLock<Vec<String>>>,
    /// If set, the next probe will fail with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
}

impl MockImageProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the size reported for `image_url`.
    pub async fn set_size(&self, image_url: &str, size: ImageSize) {
        self.sizes.write().await.insert(image_url.to_string(), size);
    }

    /// URLs probed so far, in order.
    pub async fn probed_urls(&self) -> Vec<String> {
        self.probed.read().await.clone()
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ImageProber for MockImageProber {
    async fn probe_image_size(&self, image_url: &str) -> Result<ImageSize, SourceError> {
        self.probed.write().await.push(image_url.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self
            .sizes
            .read()
            .await
            .get(image_url)
            .copied()
            .unwrap_or(DEFAULT_IMAGE_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_and_registered_sizes() {
        let prober = MockImageProber::new();
        prober.set_size("https://img/s.jpg", ImageSize::new(300, 400)).await;

        assert_eq!(
            prober.probe_image_size("https://img/a.jpg").await.unwrap(),
            DEFAULT_IMAGE_SIZE
        );
        assert_eq!(
            prober.probe_image_size("https://img/s.jpg").await.unwrap(),
            ImageSize::new(300, 400)
        );
        assert_eq!(prober.probed_urls().await.len(), 2);
    }
}
