// SPDX-License-Identifier: GPL-3.0-only

//! Directory-backed photo library
//!
//! ```text
//! <root>/<file_name>                  Photo
//! <root>/alternates/<file_name>       AlternatePhoto
//! <root>/paired/<file_name>           PairedVideo
//! ```

use super::{
    AssetCreationRequest, AssetResource, AuthorizationStatus, LibraryError, MediaLibrary, ResourceSource,
    ResourceType, SavedAsset,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PROBE_FILE: &str = ".photoshot-write-probe";

/// Photo library stored in a plain directory
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn directory_for(root: &Path, resource_type: ResourceType) -> PathBuf {
        match resource_type {
            ResourceType::Photo => root.to_path_buf(),
            ResourceType::AlternatePhoto => root.join("alternates"),
            ResourceType::PairedVideo => root.join("paired"),
        }
    }
}

/// Authorized when the root exists (or can be created) and accepts writes
fn probe_authorization(root: &Path) -> AuthorizationStatus {
    if let Err(e) = std::fs::create_dir_all(root) {
        warn!(root = %root.display(), error = %e, "Cannot create library directory");
        return AuthorizationStatus::Denied;
    }
    let probe = root.join(PROBE_FILE);
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            AuthorizationStatus::Authorized
        }
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Library directory is not writable");
            AuthorizationStatus::Denied
        }
    }
}

/// First name in `dir` that doesn't exist yet: `name`, `stem-1.ext`, `stem-2.ext`, ...
fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{}-{}.{}", stem, n, ext)),
            None => dir.join(format!("{}-{}", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

fn write_resource(root: &Path, resource: &AssetResource) -> std::io::Result<PathBuf> {
    let dir = DirectoryLibrary::directory_for(root, resource.resource_type);
    std::fs::create_dir_all(&dir)?;
    let dest = unique_destination(&dir, &resource.file_name);

    match &resource.source {
        ResourceSource::Data(data) => std::fs::write(&dest, data)?,
        ResourceSource::File(src) => {
            std::fs::copy(src, &dest)?;
        }
    }
    debug!(
        resource = ?resource.resource_type,
        path = %dest.display(),
        "Library resource stored"
    );
    Ok(dest)
}

/// Store every resource or none of them
fn write_asset(root: &Path, request: AssetCreationRequest) -> Result<SavedAsset, LibraryError> {
    if request.is_empty() {
        return Err(LibraryError::EmptyRequest);
    }

    let mut paths = Vec::with_capacity(request.resources().len());
    for resource in request.resources() {
        match write_resource(root, resource) {
            Ok(dest) => paths.push(dest),
            Err(e) => {
                warn!(
                    resource = ?resource.resource_type,
                    error = %e,
                    stored = paths.len(),
                    "Asset creation failed, rolling back"
                );
                for path in &paths {
                    if let Err(e) = std::fs::remove_file(path) {
                        warn!(path = %path.display(), error = %e, "Failed to roll back resource");
                    }
                }
                return Err(e.into());
            }
        }
    }

    let id = paths
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!(id = %id, resources = paths.len(), "Asset created");
    Ok(SavedAsset { id, paths })
}

impl MediaLibrary for DirectoryLibrary {
    fn request_authorization(&self) -> BoxFuture<'static, AuthorizationStatus> {
        let root = self.root.clone();
        async move {
            tokio::task::spawn_blocking(move || probe_authorization(&root))
                .await
                .unwrap_or(AuthorizationStatus::NotDetermined)
        }
        .boxed()
    }

    fn perform_changes(
        &self,
        request: AssetCreationRequest,
    ) -> BoxFuture<'static, Result<SavedAsset, LibraryError>> {
        let root = self.root.clone();
        async move {
            tokio::task::spawn_blocking(move || write_asset(&root, request))
                .await
                .map_err(|e| LibraryError::Io(e.to_string()))?
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_authorizes_creatable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(dir.path().join("PhotoShot"));
        assert_eq!(
            library.request_authorization().await,
            AuthorizationStatus::Authorized
        );
        assert!(library.root().is_dir());
        assert!(!library.root().join(PROBE_FILE).exists());
    }

    #[tokio::test]
    async fn test_denies_root_below_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let library = DirectoryLibrary::new(file.join("PhotoShot"));
        assert_eq!(
            library.request_authorization().await,
            AuthorizationStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_writes_photo_and_alternate_resources() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch.jpg");
        std::fs::write(&scratch, b"alternate").unwrap();
        let library = DirectoryLibrary::new(dir.path().join("lib"));

        let request = AssetCreationRequest::for_asset()
            .add_resource_with_data(ResourceType::Photo, Arc::from(&b"primary"[..]), "img.jpg")
            .add_resource_with_file(ResourceType::AlternatePhoto, scratch, "img.jpg");
        let asset = library.perform_changes(request).await.unwrap();

        assert_eq!(asset.id, "img");
        assert_eq!(asset.paths[0], dir.path().join("lib/img.jpg"));
        assert_eq!(asset.paths[1], dir.path().join("lib/alternates/img.jpg"));
        assert_eq!(std::fs::read(&asset.paths[0]).unwrap(), b"primary");
        assert_eq!(std::fs::read(&asset.paths[1]).unwrap(), b"alternate");
    }

    #[tokio::test]
    async fn test_existing_files_are_not_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(dir.path());
        let request = || {
            AssetCreationRequest::for_asset().add_resource_with_data(
                ResourceType::Photo,
                Arc::from(&b"data"[..]),
                "img.jpg",
            )
        };
        library.perform_changes(request()).await.unwrap();
        let second = library.perform_changes(request()).await.unwrap();
        assert_eq!(second.paths[0], dir.path().join("img-1.jpg"));
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryLibrary::new(dir.path());
        let result = library
            .perform_changes(AssetCreationRequest::for_asset())
            .await;
        assert_eq!(result.unwrap_err(), LibraryError::EmptyRequest);
    }

    #[tokio::test]
    async fn test_failed_resource_rolls_back_stored_ones() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("lib");
        std::fs::create_dir_all(&root).unwrap();
        // Alternates can't be created below a regular file
        std::fs::write(root.join("alternates"), b"x").unwrap();
        let scratch = dir.path().join("scratch.jpg");
        std::fs::write(&scratch, b"alternate").unwrap();
        let library = DirectoryLibrary::new(&root);

        let request = AssetCreationRequest::for_asset()
            .add_resource_with_data(ResourceType::Photo, Arc::from(&b"primary"[..]), "img.jpg")
            .add_resource_with_file(ResourceType::AlternatePhoto, scratch.clone(), "img.jpg");
        let result = library.perform_changes(request).await;

        assert!(matches!(result, Err(LibraryError::Io(_))));
        assert!(!root.join("img.jpg").exists());
        assert!(scratch.exists());
    }
}
