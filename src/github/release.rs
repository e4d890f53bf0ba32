//! Release metadata returned by the GitHub releases API.

use serde::{Deserialize, Serialize};

use crate::core::InstllrError;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset id
    pub id: u64,
    /// File name, e.g. `svc-linux-x64.tar.xz`
    pub name: String,
    /// API URL of the asset; fetched with `Accept: application/octet-stream`
    pub url: String,
}

/// A GitHub release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release id
    pub id: u64,
    /// Release tag, the version recorded in the ledger
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Display name; GitHub sends `null` for untitled releases
    #[serde(default)]
    pub name: Option<String>,
    /// Attached files
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Pick the asset to install.
    ///
    /// Without a filter the release must carry exactly one asset. With a filter the first
    /// asset whose name starts with it wins.
    ///
    /// # Errors
    ///
    /// - [`InstllrError::AssetNotFound`] when nothing matches
    /// - [`InstllrError::AmbiguousAsset`] when there is no filter and several assets exist
    pub fn select_asset(&self, filter: Option<&str>) -> Result<&ReleaseAsset, InstllrError> {
        let not_found = || InstllrError::AssetNotFound {
            release: self.tag.clone(),
            filter: filter.map(str::to_string),
        };

        match filter {
            Some(prefix) => {
                self.assets.iter().find(|asset| asset.name.starts_with(prefix)).ok_or_else(not_found)
            }
            None => match self.assets.as_slice() {
                [] => Err(not_found()),
                [only] => Ok(only),
                many => Err(InstllrError::AmbiguousAsset {
                    release: self.tag.clone(),
                    count: many.len(),
                }),
            },
        }
    }
}
