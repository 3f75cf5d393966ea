use crate::TriageError;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Where batch triage finds a test's SVG when the transcript did not embed it.
pub trait SvgSource {
    /// `Ok(None)` means the source simply does not know the test.
    fn svg_for(&self, test_name: &str) -> Result<Option<String>, TriageError>;
}

/// Never has an SVG; batch triage then relies on embedded blocks only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSvgSource;

impl SvgSource for NoSvgSource {
    fn svg_for(&self, _test_name: &str) -> Result<Option<String>, TriageError> {
        Ok(None)
    }
}

/// Reads `<root>/<test_name>`, e.g. a checkout of the conformance suite's `tests/` directory.
#[derive(Debug, Clone)]
pub struct DirSvgSource {
    root: PathBuf,
}

impl DirSvgSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SvgSource for DirSvgSource {
    fn svg_for(&self, test_name: &str) -> Result<Option<String>, TriageError> {
        let path = self.root.join(test_name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TriageError::ReadFile { path, source }),
        }
    }
}

/// In-memory sources keyed by test name.
impl SvgSource for IndexMap<String, String> {
    fn svg_for(&self, test_name: &str) -> Result<Option<String>, TriageError> {
        Ok(self.get(test_name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_source_reads_existing_files_and_skips_missing_ones() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("e-text-001.svg"), "<svg/>").unwrap();
        let source = DirSvgSource::new(tmp.path());

        assert_eq!(
            source.svg_for("e-text-001.svg").unwrap().as_deref(),
            Some("<svg/>")
        );
        assert_eq!(source.svg_for("e-text-404.svg").unwrap(), None);
    }

    #[test]
    fn dir_source_reports_unreadable_entries() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("e-text-002.svg")).unwrap();
        let source = DirSvgSource::new(tmp.path());
        assert!(matches!(
            source.svg_for("e-text-002.svg"),
            Err(TriageError::ReadFile { .. })
        ));
    }
}
