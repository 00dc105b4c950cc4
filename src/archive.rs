//! In-memory KMZ container.
//!
//! The packager is a typestate: [`KmzArchive`] accepts entries until
//! [`KmzArchive::close`] finalizes it into a [`ClosedArchive`], whose only
//! operation is reading the finished bytes back out. The backing buffer is
//! owned by the writer and handed over on close, so it can never be read while
//! still being written or written after it has been read. Dropping either
//! state at any point releases everything.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use log::{debug, error};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{KmzError, Result};

pub const WAYLINES_ENTRY: &str = "wpmz/waylines.wpml";
pub const TEMPLATE_ENTRY: &str = "wpmz/template.kml";

/// Backing store an archive is written into and later read back from.
pub trait ArchiveSink: Read + Write + Seek {
    /// Discard any previous content so the archive starts empty.
    fn truncate(&mut self) -> io::Result<()>;
}

impl ArchiveSink for Cursor<Vec<u8>> {
    fn truncate(&mut self) -> io::Result<()> {
        self.get_mut().clear();
        self.set_position(0);
        Ok(())
    }
}

/// Archive in its writable state.
pub struct KmzArchive<S: ArchiveSink = Cursor<Vec<u8>>> {
    writer: ZipWriter<S>,
    entries: Vec<String>,
    failed: bool,
}

impl KmzArchive {
    /// Fresh archive over a growable in-memory buffer.
    pub fn in_memory() -> Result<Self> {
        Self::create(Cursor::new(Vec::new()))
    }
}

impl<S: ArchiveSink> KmzArchive<S> {
    /// Open an archive over `sink` in create/truncate mode.
    pub fn create(mut sink: S) -> Result<Self> {
        sink.truncate().map_err(|e| {
            error!("Failed to prepare archive buffer: {e}");
            KmzError::ArchiveInit(e)
        })?;
        Ok(Self {
            writer: ZipWriter::new(sink),
            entries: Vec::new(),
            failed: false,
        })
    }

    /// Add a UTF-8 text entry. An existing entry with the same path is an error.
    pub fn add_file(&mut self, path: &str, content: &str) -> Result<()> {
        let stage = format!("entry '{path}'");
        if self.failed {
            return Err(KmzError::write(stage, earlier_failure()));
        }
        if self.entries.iter().any(|e| e == path) {
            return Err(KmzError::write(
                stage,
                io::Error::new(io::ErrorKind::AlreadyExists, "duplicate entry"),
            ));
        }

        let result = self
            .writer
            .start_file(path, entry_options())
            .and_then(|()| self.writer.write_all(content.as_bytes()).map_err(Into::into));

        if let Err(e) = result {
            error!("Failed to add '{path}' to archive: {e}");
            // best effort; the whole archive is discarded by the caller anyway
            let _ = self.writer.abort_file();
            self.failed = true;
            return Err(KmzError::write(stage, e));
        }

        debug!("Added '{path}' ({} bytes)", content.len());
        self.entries.push(path.to_string());
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Finalize the central directory and hand the buffer over for reading.
    ///
    /// An archive that already failed a write is never finalized.
    pub fn close(self) -> Result<ClosedArchive<S>> {
        let Self {
            writer,
            entries,
            failed,
        } = self;
        if failed {
            return Err(KmzError::write("finalize", earlier_failure()));
        }
        let source = writer.finish().map_err(|e| {
            error!("Failed to finalize archive: {e}");
            KmzError::write("finalize", e)
        })?;
        Ok(ClosedArchive { source, entries })
    }
}

fn earlier_failure() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "archive failed an earlier write")
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

/// Finalized archive; can only be read.
pub struct ClosedArchive<S: ArchiveSink = Cursor<Vec<u8>>> {
    source: S,
    entries: Vec<String>,
}

impl<S: ArchiveSink> ClosedArchive<S> {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Read the whole container into an owned buffer and verify that it opens
    /// as a zip holding exactly the entries that were written.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let bytes = read_all(&mut self.source).map_err(|e| {
            error!("Failed to read finished archive: {e}");
            KmzError::ArchiveRead(e.to_string())
        })?;

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).map_err(|e| {
            KmzError::ArchiveRead(format!("finished archive is not a valid zip: {e}"))
        })?;
        if archive.len() != self.entries.len() {
            return Err(KmzError::ArchiveRead(format!(
                "expected {} entries, found {}",
                self.entries.len(),
                archive.len()
            )));
        }
        if let Some(missing) = self
            .entries
            .iter()
            .find(|name| archive.index_for_name(name).is_none())
        {
            return Err(KmzError::ArchiveRead(format!("entry '{missing}' is missing")));
        }
        drop(archive);

        Ok(bytes)
    }
}

fn read_all<R: Read + Seek>(source: &mut R) -> io::Result<Vec<u8>> {
    let size = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;

    let len = usize::try_from(size)
        .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "archive larger than memory"))?;
    let mut data = vec![0u8; len];
    source.read_exact(&mut data)?;
    Ok(data)
}

/// Package the two serialized documents into a finished KMZ buffer.
pub fn package(waylines_wpml: &str, template_kml: &str) -> Result<Vec<u8>> {
    let mut archive = KmzArchive::in_memory()?;
    archive.add_file(WAYLINES_ENTRY, waylines_wpml)?;
    archive.add_file(TEMPLATE_ENTRY, template_kml)?;
    archive.close()?.into_bytes()
}
