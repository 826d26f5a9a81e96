// io.rs
// Scoped access to simulator logs and output artifacts.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, VizError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a log for a single forward pass. Gzip-compressed logs are decoded transparently.
///
/// The returned reader owns the file handle, so dropping it (including on an
/// early error return) closes the source.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| VizError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let compressed = {
        let head = reader.fill_buf().map_err(|source| VizError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        head.len() >= 2 && head[..2] == GZIP_MAGIC
    };
    if compressed {
        debug!(path = %path.display(), "decoding gzip log");
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Build `<dir>/<stem>[_<variant>].<ext>`.
pub fn artifact_path(dir: &Path, stem: &str, variant: Option<&str>, ext: &str) -> PathBuf {
    let name = match variant {
        Some(v) if !v.is_empty() => format!("{stem}_{v}.{ext}"),
        _ => format!("{stem}.{ext}"),
    };
    dir.join(name)
}

/// Stem of an input path, used to name artifacts derived from it.
pub fn source_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    // `foo.txt.gz` -> `foo`
    match stem.rsplit_once('.') {
        Some((base, _)) if path.extension().is_some_and(|e| e == "gz") => base.to_string(),
        _ => stem,
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write through a temporary sibling file and rename it into place, so an
/// interrupted run never leaves a truncated artifact behind.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    ensure_parent_dir(path)?;
    let tmp_path = path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(".tmp");
        os
    });
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        if let Err(e) = write(&mut writer).and_then(|_| writer.flush().map_err(VizError::from)) {
            drop(writer);
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Read;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nbody_viz_io_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = open_source("definitely/not/here.txt").err().unwrap();
        assert!(matches!(err, VizError::SourceUnavailable { .. }));
    }

    #[test]
    fn gzip_logs_are_decoded() {
        let dir = scratch_dir("gz");
        let path = dir.join("positions.txt.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"# Timestep 0\n0 1.0 2.0\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut text = String::new();
        open_source(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "# Timestep 0\n0 1.0 2.0\n");
        assert_eq!(source_stem(&path), "positions");
    }

    #[test]
    fn plain_logs_pass_through() {
        let dir = scratch_dir("plain");
        let path = dir.join("entropy_log.txt");
        std::fs::write(&path, "0 1.5\n").unwrap();
        let mut text = String::new();
        open_source(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "0 1.5\n");
    }

    #[test]
    fn variant_is_explicit_suffix() {
        let dir = Path::new("out");
        assert_eq!(
            artifact_path(dir, "energy_evolution", Some("openmp"), "png"),
            dir.join("energy_evolution_openmp.png")
        );
        assert_eq!(
            artifact_path(dir, "energy_evolution", None, "png"),
            dir.join("energy_evolution.png")
        );
    }

    #[test]
    fn failed_write_leaves_no_artifact() {
        let dir = scratch_dir("atomic");
        let path = dir.join("series.csv");
        let result = write_atomically(&path, |_| Err(VizError::InvalidConfig("boom".into())));
        assert!(result.is_err());
        assert!(!path.exists());
        write_atomically(&path, |w| {
            w.write_all(b"ok")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ok");
    }
}
