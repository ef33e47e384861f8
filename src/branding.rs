//! Branding asset lookup with placeholder fallback.

use crate::error::{DashboardError, Result};
use crate::logging::log_asset_fallback;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

const PLACEHOLDER_BASE: &str = "https://via.placeholder.com/200x50";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Branding {
    Asset {
        path: PathBuf,
        bytes: usize,
        sha256: String,
    },
    Placeholder {
        url: String,
    },
}

fn read_asset(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| DashboardError::AssetLoad {
        path: path.to_path_buf(),
        source,
    })
}

pub fn placeholder_url(brand_name: &str) -> String {
    Url::parse_with_params(PLACEHOLDER_BASE, &[("text", brand_name)])
        .map(String::from)
        .unwrap_or_else(|_| PLACEHOLDER_BASE.to_string())
}

/// Returns the first readable candidate, or a placeholder if none loads.
pub fn load_branding(candidates: &[PathBuf], brand_name: &str) -> Branding {
    for path in candidates {
        match read_asset(path) {
            Ok(bytes) => {
                return Branding::Asset {
                    path: path.clone(),
                    bytes: bytes.len(),
                    sha256: hex::encode(Sha256::digest(&bytes)),
                }
            }
            Err(err) => log_asset_fallback(&path.display().to_string(), &err.to_string()),
        }
    }
    Branding::Placeholder {
        url: placeholder_url(brand_name),
    }
}
