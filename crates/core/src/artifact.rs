//! Persisted snapshot artifact.
//!
//! The last successfully published generation is written to disk as JSON so
//! a restarted process can serve it before its first refresh completes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::record::{CatalogRecord, Generation, GenerationInfo};

/// Errors reading or writing the artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("artifact at {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactRef<'a> {
    sealed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_url: Option<&'a str>,
    records: &'a [CatalogRecord],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    sealed_at: DateTime<Utc>,
    #[serde(default)]
    source_url: Option<String>,
    records: Vec<CatalogRecord>,
}

/// Write a sealed generation to `path`.
///
/// The JSON goes to a sibling temp file first and is renamed into place, so
/// a crash mid-write leaves the previous artifact intact.
pub fn write_artifact(path: &Path, generation: &Generation) -> Result<(), ArtifactError> {
    let io_err = |source: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_vec_pretty(&ArtifactRef {
        sealed_at: generation.sealed_at(),
        source_url: generation.source_url(),
        records: generation.records(),
    })
    .map_err(|source| ArtifactError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(&body).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);
    fs::rename(&tmp, path).map_err(io_err)?;

    info!(path = %path.display(), records = generation.len(), "Snapshot artifact written");
    Ok(())
}

/// Read the artifact at `path`; `Ok(None)` when there is none.
pub fn load_artifact(path: &Path) -> Result<Option<Generation>, ArtifactError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file: ArtifactFile =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Format {
            path: path.to_path_buf(),
            source,
        })?;

    let (generation, duplicates) = Generation::from_records(file.records);
    if !duplicates.is_empty() {
        warn!(
            path = %path.display(),
            dropped = duplicates.len(),
            "Artifact contained duplicate records"
        );
    }

    Ok(Some(
        generation
            .with_sealed_at(file.sealed_at)
            .with_source_url(file.source_url),
    ))
}

/// Publish the artifact into `store` if the store has never been populated.
///
/// Returns the published generation, or `None` when the store already had
/// one or no artifact exists.
pub fn seed_from_artifact(
    store: &dyn CatalogStore,
    path: &Path,
) -> Result<Option<GenerationInfo>, SeedError> {
    if store.current()?.info().id != 0 {
        return Ok(None);
    }

    let Some(generation) = load_artifact(path)? else {
        return Ok(None);
    };

    let info = store.publish(generation)?;
    info!(
        generation = info.id,
        records = info.record_count,
        "Catalog seeded from snapshot artifact"
    );
    Ok(Some(info))
}

/// Errors seeding a store from the artifact.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Catalog(#[from] crate::catalog::CatalogError),
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
