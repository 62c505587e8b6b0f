use futures::future::try_join_all;
use keepsake_compress::{CompressedImage, CompressionSettings};
use keepsake_config::CompressionConfig;

use crate::{
    error::{Result, StudioError},
    upload::UploadedFile,
};

pub fn settings_from_config(config: &CompressionConfig) -> CompressionSettings {
    CompressionSettings {
        initial_quality: config.initial_quality,
        min_quality: config.min_quality,
        quality_step: config.quality_step,
        rescale_quality: config.rescale_quality,
        scale_step: config.scale_step,
        min_dimension: config.min_dimension,
    }
}

/// Compress every file on the blocking pool
///
/// Fails as a whole if any single file fails; results keep input order.
pub async fn compress_batch(
    files: Vec<UploadedFile>,
    target_bytes: usize,
    settings: &CompressionSettings,
) -> Result<Vec<CompressedImage>> {
    let tasks = files.into_iter().map(|file| {
        let settings = settings.clone();

        tokio::task::spawn_blocking(move || {
            keepsake_compress::compress(&file.bytes, target_bytes, &settings).inspect_err(|e| {
                tracing::warn!(
                    file_name = ?file.file_name,
                    content_type = %file.content_type,
                    error = %e,
                    "image rejected"
                );
            })
        })
    });

    let results = try_join_all(tasks)
        .await
        .map_err(|e| StudioError::Internal(format!("compression task failed: {e}")))?;

    results
        .into_iter()
        .collect::<keepsake_compress::Result<Vec<_>>>()
        .map_err(StudioError::from)
}
