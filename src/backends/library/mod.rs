// SPDX-License-Identifier: GPL-3.0-only

//! Photo library abstraction
//!
//! A library grants (or refuses) write access and ingests change requests
//! that create one asset out of several resources. Both operations are
//! asynchronous and resolve exactly once.

mod directory;

pub use directory::DirectoryLibrary;

use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;

/// Whether the app may add assets to the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        self == AuthorizationStatus::Authorized
    }
}

/// Role of a resource within an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Primary still image
    Photo,
    /// Alternate representation of the still (e.g. a second encoding)
    AlternatePhoto,
    /// Motion clip paired with a live photo
    PairedVideo,
}

/// Where a resource's bytes come from
#[derive(Debug, Clone)]
pub enum ResourceSource {
    Data(Arc<[u8]>),
    File(PathBuf),
}

/// One resource of an asset creation request
#[derive(Debug, Clone)]
pub struct AssetResource {
    pub resource_type: ResourceType,
    pub source: ResourceSource,
    /// File name the library should store the resource under
    pub file_name: String,
}

/// Change request creating a single asset
#[derive(Debug, Clone, Default)]
pub struct AssetCreationRequest {
    resources: Vec<AssetResource>,
}

impl AssetCreationRequest {
    pub fn for_asset() -> Self {
        Self::default()
    }

    pub fn add_resource_with_data(
        mut self,
        resource_type: ResourceType,
        data: Arc<[u8]>,
        file_name: impl Into<String>,
    ) -> Self {
        self.resources.push(AssetResource {
            resource_type,
            source: ResourceSource::Data(data),
            file_name: file_name.into(),
        });
        self
    }

    pub fn add_resource_with_file(
        mut self,
        resource_type: ResourceType,
        path: PathBuf,
        file_name: impl Into<String>,
    ) -> Self {
        self.resources.push(AssetResource {
            resource_type,
            source: ResourceSource::File(path),
            file_name: file_name.into(),
        });
        self
    }

    pub fn resources(&self) -> &[AssetResource] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// A created asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    pub id: String,
    /// Stored location of each resource, in request order
    pub paths: Vec<PathBuf>,
}

/// Library errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// Write access was not granted
    NotAuthorized,
    /// A change request without resources
    EmptyRequest,
    /// Reading a resource or writing the asset failed
    Io(String),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::NotAuthorized => write!(f, "Not authorized to write to the library"),
            LibraryError::EmptyRequest => write!(f, "Asset creation request has no resources"),
            LibraryError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err.to_string())
    }
}

/// Photo library the app saves into
pub trait MediaLibrary: Send + Sync {
    /// Ask for write access
    fn request_authorization(&self) -> BoxFuture<'static, AuthorizationStatus>;

    /// Create one asset from the request's resources
    fn perform_changes(
        &self,
        request: AssetCreationRequest,
    ) -> BoxFuture<'static, Result<SavedAsset, LibraryError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_keeps_order() {
        let request = AssetCreationRequest::for_asset()
            .add_resource_with_data(ResourceType::Photo, Arc::from(vec![1u8, 2, 3]), "a.jpg")
            .add_resource_with_file(ResourceType::AlternatePhoto, PathBuf::from("/tmp/a.jpg"), "a.jpg");
        assert_eq!(request.resources().len(), 2);
        assert_eq!(request.resources()[0].resource_type, ResourceType::Photo);
        assert!(matches!(
            request.resources()[1].source,
            ResourceSource::File(_)
        ));
    }

    #[test]
    fn test_only_authorized_status_grants_access() {
        assert!(AuthorizationStatus::Authorized.is_authorized());
        assert!(!AuthorizationStatus::Denied.is_authorized());
        assert!(!AuthorizationStatus::NotDetermined.is_authorized());
    }
}
