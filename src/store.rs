//! Pattern persistence.
//!
//! A pattern file is a YAML sequence of exactly 256 booleans in row-major
//! order (instrument 0 steps 0..16, instrument 1 steps 0..16, ...). Nothing
//! else is stored: no header, no version, no tempo.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::pattern::{Pattern, SerializedPattern};

/// Name reported in [`Error::Io`] for failures on a bare stream.
const STREAM_PATH: &str = "<stream>";

fn encode(pattern: &Pattern) -> Result<String> {
    serde_yaml::to_string(pattern.to_flat_array().as_slice())
        .map_err(|e| Error::Format(format!("cannot encode pattern: {}", e)))
}

fn write_encoded<W: Write>(pattern: &Pattern, mut writer: W, path: &Path) -> Result<()> {
    let encoded = encode(pattern)?;
    writer
        .write_all(encoded.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| Error::io(path, e))
}

/// Write the pattern's cells to `writer`.
pub fn save_to_writer<W: Write>(pattern: &Pattern, writer: W) -> Result<()> {
    write_encoded(pattern, writer, Path::new(STREAM_PATH))
}

/// Read and validate a serialized pattern from `reader`.
pub fn load_from_reader<R: Read>(reader: R) -> Result<SerializedPattern> {
    let cells: Vec<bool> = serde_yaml::from_reader(reader)
        .map_err(|e| Error::Format(format!("not a list of booleans: {}", e)))?;
    SerializedPattern::try_from(cells.as_slice())
}

/// Save the pattern to a file, replacing it if present.
pub fn save<P: AsRef<Path>>(pattern: &Pattern, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    write_encoded(pattern, BufWriter::new(file), path)?;

    info!(path = %path.display(), active = pattern.active_cells(), "pattern saved");
    Ok(())
}

/// Load a serialized pattern from a file.
///
/// Only reads; applying the result to a [`Pattern`] and restarting playback
/// is up to the caller.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SerializedPattern> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let serialized = load_from_reader(BufReader::new(file))?;
    info!(path = %path.display(), "pattern loaded");
    Ok(serialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::CELL_COUNT;
    use tempfile::tempdir;

    fn write_cells(path: &Path, count: usize) {
        let cells = vec![false; count];
        std::fs::write(path, serde_yaml::to_string(&cells).unwrap()).unwrap();
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groove.yaml");

        let mut pattern = Pattern::new();
        pattern.set_cell(0, 0, true).unwrap();
        pattern.set_cell(3, 4, true).unwrap();
        pattern.set_cell(15, 15, true).unwrap();
        pattern.scale_tempo_factor(1.5);

        save(&pattern, &path).unwrap();
        let serialized = load(&path).unwrap();

        let mut restored = Pattern::new();
        restored.load_serialized(&serialized);
        for i in 0..16 {
            assert_eq!(restored.row(i), pattern.row(i));
        }
        // Tempo is not part of the file.
        assert_eq!(restored.tempo_factor(), 1.0);
    }

    #[test]
    fn test_file_is_plain_boolean_list() {
        let mut buf = Vec::new();
        let mut pattern = Pattern::new();
        pattern.set_cell(0, 1, true).unwrap();
        save_to_writer(&pattern, &mut buf).unwrap();

        let cells: Vec<bool> = serde_yaml::from_slice(&buf).unwrap();
        assert_eq!(cells.len(), CELL_COUNT);
        assert!(!cells[0]);
        assert!(cells[1]);
    }

    /// A writer that refuses everything with a fixed error kind.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_failure_keeps_io_error_kind() {
        match save_to_writer(&Pattern::new(), FullDisk) {
            Err(Error::Io { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::WriteZero);
            }
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_length_is_format_error() {
        let dir = tempdir().unwrap();
        for count in [CELL_COUNT - 1, CELL_COUNT + 1] {
            let path = dir.path().join(format!("{}.yaml", count));
            write_cells(&path, count);
            assert!(matches!(load(&path), Err(Error::Format(_))));
        }
    }

    #[test]
    fn test_failed_load_leaves_pattern_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.yaml");
        write_cells(&path, CELL_COUNT - 1);

        let mut pattern = Pattern::new();
        pattern.set_cell(7, 7, true).unwrap();
        let before = pattern.clone();

        if let Ok(serialized) = load(&path) {
            pattern.load_serialized(&serialized);
        }
        assert_eq!(pattern, before);
    }

    #[test]
    fn test_non_boolean_content_is_format_error() {
        let result = load_from_reader("name: not a pattern\n".as_bytes());
        assert!(matches!(result, Err(Error::Format(_))));

        let result = load_from_reader("[1, 2, 3]".as_bytes());
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("p.yaml");
        assert!(matches!(
            save(&Pattern::new(), path),
            Err(Error::Io { .. })
        ));
    }
}
