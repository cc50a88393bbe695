//! Scratch storage for streamed model bodies.
//!
//! A scratch buffer accumulates downloaded bytes until the body is complete,
//! then exposes them to the deserializer. Two backings exist: a temporary file
//! on disk and a purely in-memory buffer for hosts without a writable disk.
//! The backing is chosen once, when the provider is built.

use std::io::{self, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

/// File suffix given to scratch artifacts.
pub const SCRATCH_SUFFIX: &str = ".mlmodel";

/// Directory prefix used in the names of in-memory scratch buffers.
pub const VIRTUAL_TEMP_DIR: &str = "/virtual/temp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchKind {
    Disk,
    Memory,
}

/// A completed scratch artifact, as handed to the deserializer.
#[derive(Debug, Clone, Copy)]
pub enum ScratchArtifact<'a> {
    File(&'a Path),
    Memory(&'a [u8]),
}

impl<'a> ScratchArtifact<'a> {
    pub fn kind(&self) -> ScratchKind {
        match self {
            Self::File(_) => ScratchKind::Disk,
            Self::Memory(_) => ScratchKind::Memory,
        }
    }

    /// Artifact contents without copying: file-backed artifacts are mapped.
    pub fn bytes(&self) -> io::Result<ArtifactBytes<'a>> {
        match *self {
            Self::Memory(bytes) => Ok(ArtifactBytes::Borrowed(bytes)),
            Self::File(path) => {
                let file = std::fs::File::open(path)?;
                if file.metadata()?.len() == 0 {
                    return Ok(ArtifactBytes::Borrowed(&[]));
                }
                // SAFETY: the scratch file is owned by this load and is not
                // written again once the artifact has been handed out.
                let mmap = unsafe { Mmap::map(&file)? };
                Ok(ArtifactBytes::Mapped(mmap))
            }
        }
    }
}

/// Borrowed or memory-mapped artifact contents.
pub enum ArtifactBytes<'a> {
    Borrowed(&'a [u8]),
    Mapped(Mmap),
}

impl Deref for ArtifactBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Borrowed(bytes) => *bytes,
            Self::Mapped(mmap) => &mmap[..],
        }
    }
}

/// Scratch region owned by exactly one load.
pub trait ScratchBuffer: Send {
    /// Path of the temp file, or the virtual name of an in-memory buffer.
    fn name(&self) -> &str;

    fn kind(&self) -> ScratchKind;

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    fn bytes_written(&self) -> u64;

    /// Finish writing and expose the contents.
    fn artifact(&mut self) -> io::Result<ScratchArtifact<'_>>;

    /// Close and delete the buffer.
    fn release(self: Box<Self>) -> io::Result<()>;
}

/// Creates scratch buffers of one fixed kind.
pub trait ScratchProvider: Send + Sync {
    fn kind(&self) -> ScratchKind;

    fn create(&self) -> io::Result<Box<dyn ScratchBuffer>>;
}

/// Pick the provider for this process: memory when `memory_only` is set.
pub fn scratch_provider(memory_only: bool, dir: Option<PathBuf>) -> Arc<dyn ScratchProvider> {
    if memory_only {
        Arc::new(MemoryScratchProvider)
    } else {
        Arc::new(DiskScratchProvider::new(dir))
    }
}

/// Temp files in `dir`, or the system temp dir.
#[derive(Debug, Clone, Default)]
pub struct DiskScratchProvider {
    dir: Option<PathBuf>,
}

impl DiskScratchProvider {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl ScratchProvider for DiskScratchProvider {
    fn kind(&self) -> ScratchKind {
        ScratchKind::Disk
    }

    fn create(&self) -> io::Result<Box<dyn ScratchBuffer>> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("model-").suffix(SCRATCH_SUFFIX);
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let name = file.path().display().to_string();
        debug!(path = %name, "Created scratch file");
        Ok(Box::new(DiskScratch { file, name, written: 0 }))
    }
}

struct DiskScratch {
    file: NamedTempFile,
    name: String,
    written: u64,
}

impl ScratchBuffer for DiskScratch {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ScratchKind {
        ScratchKind::Disk
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    fn artifact(&mut self) -> io::Result<ScratchArtifact<'_>> {
        self.file.flush()?;
        Ok(ScratchArtifact::File(self.file.path()))
    }

    fn release(self: Box<Self>) -> io::Result<()> {
        debug!(path = %self.name, "Removing scratch file");
        self.file.close()
    }
}

/// In-memory buffers with virtual temp-file names.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryScratchProvider;

impl ScratchProvider for MemoryScratchProvider {
    fn kind(&self) -> ScratchKind {
        ScratchKind::Memory
    }

    fn create(&self) -> io::Result<Box<dyn ScratchBuffer>> {
        let name = format!("{}/tmp_{}{}", VIRTUAL_TEMP_DIR, Uuid::new_v4().simple(), SCRATCH_SUFFIX);
        debug!(name = %name, "Created virtual scratch buffer");
        Ok(Box::new(MemoryScratch { buffer: Vec::new(), name }))
    }
}

struct MemoryScratch {
    buffer: Vec<u8>,
    name: String,
}

impl ScratchBuffer for MemoryScratch {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ScratchKind {
        ScratchKind::Memory
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn artifact(&mut self) -> io::Result<ScratchArtifact<'_>> {
        Ok(ScratchArtifact::Memory(&self.buffer))
    }

    fn release(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_disk_scratch_roundtrip_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DiskScratchProvider::new(Some(dir.path().to_path_buf()));

        let mut scratch = provider.create().unwrap();
        assert_eq!(scratch.kind(), ScratchKind::Disk);
        assert!(scratch.name().ends_with(SCRATCH_SUFFIX));
        assert_eq!(entries(dir.path()), 1);

        scratch.write_chunk(b"hello ").unwrap();
        scratch.write_chunk(b"model").unwrap();
        assert_eq!(scratch.bytes_written(), 11);

        {
            let artifact = scratch.artifact().unwrap();
            assert_eq!(artifact.kind(), ScratchKind::Disk);
            assert_eq!(&*artifact.bytes().unwrap(), b"hello model");
        }

        scratch.release().unwrap();
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_disk_scratch_dropped_without_release_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DiskScratchProvider::new(Some(dir.path().to_path_buf()));
        {
            let mut scratch = provider.create().unwrap();
            scratch.write_chunk(b"partial").unwrap();
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_empty_disk_artifact_maps_to_empty_slice() {
        let dir = tempfile::tempdir().unwrap();
        let mut scratch = DiskScratchProvider::new(Some(dir.path().to_path_buf())).create().unwrap();
        assert!(scratch.artifact().unwrap().bytes().unwrap().is_empty());
        scratch.release().unwrap();
    }

    #[test]
    fn test_memory_scratch_has_virtual_name() {
        let mut scratch = MemoryScratchProvider.create().unwrap();
        assert!(scratch.name().starts_with("/virtual/temp/tmp_"));
        assert!(scratch.name().ends_with(".mlmodel"));
        assert!(!Path::new(scratch.name()).exists());

        scratch.write_chunk(&[1, 2, 3]).unwrap();
        let artifact = scratch.artifact().unwrap();
        assert_eq!(artifact.kind(), ScratchKind::Memory);
        assert_eq!(&*artifact.bytes().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_provider_selection() {
        assert_eq!(scratch_provider(true, None).kind(), ScratchKind::Memory);
        assert_eq!(scratch_provider(false, None).kind(), ScratchKind::Disk);
    }
}
