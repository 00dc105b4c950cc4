use std::io;

use wasm_bindgen::JsValue;
use zip::result::ZipError;

/// Every way a mission conversion can fail.
///
/// The archive variants mirror the packager's lifecycle: `ArchiveInit` while the
/// in-memory container is being opened, `ArchiveWrite` while entries are added or
/// the central directory is finalized, `ArchiveRead` while the finished buffer is
/// read back out. No variant ever carries a partially built buffer.
#[derive(Debug, thiserror::Error)]
pub enum KmzError {
    #[error("Mission has no waypoints")]
    EmptyMission,

    #[error("Failed to initialize in-memory archive: {0}")]
    ArchiveInit(#[source] io::Error),

    #[error("Archive write failed during {stage}: {source}")]
    ArchiveWrite {
        stage: String,
        #[source]
        source: ZipError,
    },

    #[error("Failed to read finished archive: {0}")]
    ArchiveRead(String),

    #[error("Invalid mission payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("Invalid compiler configuration: {0}")]
    Config(#[source] serde_json::Error),

    #[error("XML serialization error: {0}")]
    Xml(String),
}

pub type Result<T> = std::result::Result<T, KmzError>;

impl KmzError {
    pub(crate) fn write(stage: impl Into<String>, source: impl Into<ZipError>) -> Self {
        Self::ArchiveWrite {
            stage: stage.into(),
            source: source.into(),
        }
    }

    pub(crate) fn xml(e: impl std::fmt::Display) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<KmzError> for JsValue {
    fn from(e: KmzError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_names_stage() {
        let err = KmzError::write(
            "entry 'wpmz/template.kml'",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("wpmz/template.kml"));
        assert!(matches!(err, KmzError::ArchiveWrite { .. }));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = KmzError::ArchiveInit(io::Error::new(io::ErrorKind::OutOfMemory, "oom"));
        assert!(err.source().is_some());
        assert!(KmzError::EmptyMission.source().is_none());
    }
}
