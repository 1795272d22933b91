//! Image cache
//!
//! Resolves the image a run should use: the base image when the project has
//! no setup script, otherwise a customised image tagged by its `ImageKey`
//! and built only when the daemon does not already have it.

use crate::config::schema::base_image;
use crate::error::PackrunResult;
use crate::image::context::build_context;
use crate::image::key::ImageKey;
use crate::image::{labels, ImageRef, ImageSource};
use crate::orchestration::ContainerDaemon;
use chrono::Utc;
use tracing::{debug, info};

/// Gets images from the daemon, building customised ones on demand
pub struct ImageCache<'a> {
    daemon: &'a dyn ContainerDaemon,
}

impl<'a> ImageCache<'a> {
    pub fn new(daemon: &'a dyn ContainerDaemon) -> Self {
        Self { daemon }
    }

    /// Image for `version` with `setup_script` applied.
    ///
    /// Concurrent callers with the same key may both build; the last tag
    /// written wins.
    pub async fn get_image(
        &self,
        version: &str,
        setup_script: Option<&[u8]>,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> PackrunResult<ImageRef> {
        let base = base_image(version);

        let Some(script) = setup_script else {
            debug!("No setup script, using base image {}", base);
            return Ok(ImageRef {
                image: base,
                source: ImageSource::Base,
            });
        };

        let key = ImageKey::compute(version, script);
        let tag = key.tag();
        debug!("Setup image key {} -> {}", key, tag);

        if self.daemon.image_exists(&tag).await? {
            debug!("Setup image already cached: {}", tag);
            return Ok(ImageRef {
                image: tag,
                source: ImageSource::Cached,
            });
        }

        info!("Building {} from {}", tag, base);
        let context = build_context(&base, script)?;
        let image_labels = vec![
            (labels::SETUP_HASH.to_string(), key.to_string()),
            (labels::VERSION.to_string(), version.to_string()),
            (labels::BASE_IMAGE.to_string(), base.clone()),
            (labels::CREATED_AT.to_string(), Utc::now().to_rfc3339()),
        ];

        self.daemon
            .build_image(&tag, &image_labels, context, on_output)
            .await?;

        Ok(ImageRef {
            image: tag,
            source: ImageSource::Built,
        })
    }
}
