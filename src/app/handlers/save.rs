// SPDX-License-Identifier: GPL-3.0-only

//! Save handlers
//!
//! Saving asks the library for write access, writes the image to a scratch
//! file and creates one asset holding the bytes and the scratch file as
//! alternate representations.

use crate::app::CaptureController;
use crate::app::state::{Completion, SaveOutcome};
use crate::backends::library::{AssetCreationRequest, AuthorizationStatus, ResourceType};
use crate::constants::messages;
use crate::errors::PhotoError;
use crate::storage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl CaptureController {
    // =========================================================================
    // Save Handlers
    // =========================================================================

    /// Request library access for the current image; no-op without one
    pub(crate) fn handle_save(&mut self) {
        if self.current_image.is_none() {
            debug!("No captured image to save");
            return;
        }
        let library = Arc::clone(&self.library);
        self.spawn_completion(async move {
            Completion::Authorization(library.request_authorization().await)
        });
    }

    /// Authorization answered: either toast the refusal or start the write
    pub(crate) fn handle_authorization(&mut self, status: AuthorizationStatus) {
        if !status.is_authorized() {
            warn!(?status, "Photo library access not granted");
            self.show_toast(messages::NOT_AUTHORIZED);
            return;
        }
        let Some(image) = self.current_image.clone() else {
            debug!("Captured image went away before save");
            return;
        };

        let library = Arc::clone(&self.library);
        let scratch_dir = self.scratch_dir.clone();
        let live_movie = self.current_live_movie.clone();

        self.spawn_completion(async move {
            let data = Arc::clone(&image.data);
            let name = image.file_name.clone();
            let written = tokio::task::spawn_blocking(move || {
                storage::write_scratch_file(&scratch_dir, &name, &data)
            })
            .await;
            let scratch_path = match written {
                Ok(Ok(path)) => path,
                Ok(Err(e)) => return Completion::Saved(SaveOutcome::ScratchWriteFailed(e.into())),
                Err(e) => {
                    let error = PhotoError::SaveFailed(e.to_string());
                    return Completion::Saved(SaveOutcome::ScratchWriteFailed(error));
                }
            };

            let mut request = AssetCreationRequest::for_asset()
                .add_resource_with_data(ResourceType::Photo, image.data, image.file_name.clone())
                .add_resource_with_file(
                    ResourceType::AlternatePhoto,
                    scratch_path.clone(),
                    image.file_name,
                );
            let live_movie = live_movie.filter(|path| path.is_file());
            if let Some(movie) = &live_movie {
                request = request.add_resource_with_file(
                    ResourceType::PairedVideo,
                    movie.clone(),
                    file_name_of(movie),
                );
            }

            let outcome = match library.perform_changes(request).await {
                Ok(asset) => SaveOutcome::Saved {
                    asset,
                    scratch_path,
                    live_movie,
                },
                Err(error) => SaveOutcome::LibraryFailed {
                    error,
                    scratch_path,
                },
            };
            Completion::Saved(outcome)
        });
    }

    /// Library write finished
    pub(crate) fn handle_saved(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Saved {
                asset,
                scratch_path,
                live_movie,
            } => {
                for path in std::iter::once(&scratch_path).chain(live_movie.as_ref()) {
                    if let Err(e) = storage::remove_scratch_file(path) {
                        warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
                    }
                }
                info!(id = %asset.id, resources = asset.paths.len(), "Image saved to library");
                self.view.save_visible = false;
                self.show_toast(messages::IMAGE_SAVED);
            }
            SaveOutcome::ScratchWriteFailed(e) => {
                error!(error = %e, "Failed to write scratch file");
            }
            SaveOutcome::LibraryFailed {
                error,
                scratch_path,
            } => {
                error!(
                    error = %error,
                    scratch = %scratch_path.display(),
                    "Photo library rejected the asset"
                );
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
