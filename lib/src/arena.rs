//! Per-worker named light-curve store (spec.md §4.5). Two levels,
//! `directory -> filename -> product`. `memory` handles live only in the
//! in-process map; `archive` handles are written through to disk with a
//! `key=value` side-car describing how to decode the data file.
//!
//! Single-threaded per worker (spec.md §5's shared-resource policy), so a
//! plain `HashMap` is enough — no `Mutex`, unlike [`crate`]'s store client.

use crate::error::{EasError, EasResult};
use crate::lightcurve::LightCurveProduct;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::{ArtifactHandle, ArtifactSource};

/// In-memory products, plus the filesystem root archive handles resolve
/// against.
pub struct Arena {
    memory: HashMap<(String, String), Arc<LightCurveProduct>>,
    archive_root: PathBuf,
}

impl Arena {
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        Arena {
            memory: HashMap::new(),
            archive_root: archive_root.into(),
        }
    }

    /// The filesystem root `archive` artifacts resolve against; also used
    /// as the base for the `scratch` staging directory (spec.md §4.1/§6).
    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    pub fn put(&mut self, handle: &ArtifactHandle, product: LightCurveProduct) -> EasResult<()> {
        match handle.source {
            ArtifactSource::Memory => {
                self.memory.insert(
                    (handle.directory.clone(), handle.filename.clone()),
                    Arc::new(product),
                );
                Ok(())
            }
            ArtifactSource::Archive => self.write_archive(handle, &product),
        }
    }

    pub fn get(&self, handle: &ArtifactHandle) -> EasResult<Arc<LightCurveProduct>> {
        match handle.source {
            ArtifactSource::Memory => self
                .memory
                .get(&(handle.directory.clone(), handle.filename.clone()))
                .cloned()
                .ok_or_else(|| EasError::UnknownArtifact {
                    directory: handle.directory.clone(),
                    filename: handle.filename.clone(),
                }),
            ArtifactSource::Archive => self.read_archive(handle).map(Arc::new),
        }
    }

    pub fn remove(&mut self, handle: &ArtifactHandle) -> EasResult<()> {
        match handle.source {
            ArtifactSource::Memory => {
                self.memory
                    .remove(&(handle.directory.clone(), handle.filename.clone()));
                Ok(())
            }
            ArtifactSource::Archive => {
                let (data_path, sidecar_path) = self.archive_paths(handle);
                if data_path.exists() {
                    std::fs::remove_file(&data_path)?;
                }
                if sidecar_path.exists() {
                    std::fs::remove_file(&sidecar_path)?;
                }
                Ok(())
            }
        }
    }

    fn archive_paths(&self, handle: &ArtifactHandle) -> (PathBuf, PathBuf) {
        let dir = self.archive_root.join(&handle.directory);
        let data = dir.join(&handle.filename);
        let sidecar = dir.join(format!("{}.meta", handle.filename));
        (data, sidecar)
    }

    fn write_archive(&self, handle: &ArtifactHandle, product: &LightCurveProduct) -> EasResult<()> {
        let (data_path, sidecar_path) = self.archive_paths(handle);
        if let Some(parent) = data_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_vec(product)?;
        let gzipped = true;
        write_sidecar(&sidecar_path, true, gzipped, product.metadata())?;

        let mut file = std::fs::File::create(&data_path)?;
        if gzipped {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&encoded)?;
            file.write_all(&encoder.finish()?)?;
        } else {
            file.write_all(&encoded)?;
        }
        Ok(())
    }

    fn read_archive(&self, handle: &ArtifactHandle) -> EasResult<LightCurveProduct> {
        let (data_path, sidecar_path) = self.archive_paths(handle);
        let sidecar = read_sidecar(&sidecar_path)?;
        let raw = std::fs::read(&data_path)?;
        let decoded = if sidecar.gzipped {
            let mut decoder = GzDecoder::new(raw.as_slice());
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            out
        } else {
            raw
        };
        Ok(serde_json::from_slice(&decoded)?)
    }
}

struct Sidecar {
    gzipped: bool,
}

fn write_sidecar(
    path: &Path,
    binary: bool,
    gzipped: bool,
    metadata: &HashMap<String, String>,
) -> EasResult<()> {
    let mut body = format!("binary={}\ngzipped={}\n", binary as u8, gzipped as u8);
    for (k, v) in metadata {
        body.push_str(&format!("{k}={v}\n"));
    }
    std::fs::write(path, body)?;
    Ok(())
}

fn read_sidecar(path: &Path) -> EasResult<Sidecar> {
    let text = std::fs::read_to_string(path)?;
    let mut gzipped = false;
    for line in text.lines() {
        if let Some((key, value)) = line.split_once('=') {
            if key == "gzipped" {
                gzipped = value.trim() == "1";
            }
        }
    }
    Ok(Sidecar { gzipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightcurve::ArbitraryRaster;

    fn product() -> LightCurveProduct {
        LightCurveProduct::ArbitraryRaster(
            ArbitraryRaster::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]).unwrap(),
        )
    }

    #[test]
    fn memory_round_trips() {
        let mut arena = Arena::new("/tmp/nonexistent-eas-arena-root");
        let handle = ArtifactHandle {
            source: ArtifactSource::Memory,
            directory: "dir".to_string(),
            filename: "a.lc".to_string(),
        };
        arena.put(&handle, product()).unwrap();
        let fetched = arena.get(&handle).unwrap();
        assert!(matches!(&*fetched, LightCurveProduct::ArbitraryRaster(_)));
    }

    #[test]
    fn memory_get_unknown_errors() {
        let arena = Arena::new("/tmp/nonexistent-eas-arena-root");
        let handle = ArtifactHandle {
            source: ArtifactSource::Memory,
            directory: "dir".to_string(),
            filename: "missing.lc".to_string(),
        };
        assert!(matches!(
            arena.get(&handle).unwrap_err(),
            EasError::UnknownArtifact { .. }
        ));
    }

    #[test]
    fn archive_round_trips_through_gzip_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let mut arena = Arena::new(tmp.path());
        let handle = ArtifactHandle {
            source: ArtifactSource::Archive,
            directory: "job1".to_string(),
            filename: "out.lc".to_string(),
        };
        arena.put(&handle, product()).unwrap();
        let sidecar_path = tmp.path().join("job1").join("out.lc.meta");
        assert!(sidecar_path.exists());
        let fetched = arena.get(&handle).unwrap();
        assert!(matches!(&*fetched, LightCurveProduct::ArbitraryRaster(_)));
        arena.remove(&handle).unwrap();
        assert!(!sidecar_path.exists());
    }
}
