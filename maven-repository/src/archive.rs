//! Read access to artifacts packaged as zip archives (jar, war, ear, ...).

use crate::{RepositoryError, Result};
use std::io::{Read, Seek, SeekFrom};
use zip::result::ZipError;
use zip::ZipArchive;

/// Local file header signature every zip archive starts with.
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Entry name suffix of the property file Maven embeds in built archives.
pub const POM_PROPERTIES_SUFFIX: &str = "/pom.properties";

/// Entry name suffix of the project descriptor Maven embeds in built archives.
pub const POM_XML_SUFFIX: &str = "/pom.xml";

/// Largest entry that is read into memory.
pub const MAX_ENTRY_SIZE: u64 = 16 * 1024 * 1024;

/// A zip archive opened for entry lookup.
pub struct Archive<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl<R: Read + Seek> Archive<R> {
    /// Open a reader as an archive.
    ///
    /// Returns `Ok(None)` when the content is not a zip archive at all, so the
    /// caller can fall back to other means of identification. A reader that
    /// claims to be a zip archive but cannot be read is an error.
    pub fn open(mut reader: R) -> Result<Option<Self>> {
        let mut magic = [0u8; 4];
        let read = read_prefix(&mut reader, &mut magic)?;
        reader.seek(SeekFrom::Start(0))?;
        if read < magic.len() || &magic != ZIP_MAGIC {
            return Ok(None);
        }

        match ZipArchive::new(reader) {
            Ok(zip) => Ok(Some(Self { zip })),
            Err(ZipError::InvalidArchive(_)) | Err(ZipError::UnsupportedArchive(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.zip.is_empty()
    }

    /// Names of all entries, in central directory order.
    pub fn entry_names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.zip.len());
        for i in 0..self.zip.len() {
            names.push(self.zip.by_index_raw(i)?.name().to_string());
        }
        Ok(names)
    }

    /// Find the first entry whose name ends with `suffix`.
    pub fn find_entry(&mut self, suffix: &str) -> Result<Option<String>> {
        Ok(self
            .entry_names()?
            .into_iter()
            .find(|name| name.ends_with(suffix)))
    }

    /// Read the full content of the named entry.
    ///
    /// Entries larger than [`MAX_ENTRY_SIZE`], whether declared or actual,
    /// are rejected.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self.zip.by_name(name)?;
        let declared = entry.size();
        if declared > MAX_ENTRY_SIZE {
            return Err(RepositoryError::entry_too_large(name, declared));
        }

        let mut buf = Vec::with_capacity(declared as usize);
        entry.take(MAX_ENTRY_SIZE + 1).read_to_end(&mut buf)?;
        if buf.len() as u64 > MAX_ENTRY_SIZE {
            return Err(RepositoryError::entry_too_large(name, buf.len() as u64));
        }
        Ok(buf)
    }

    /// Read the first entry whose name ends with `suffix`, if any.
    pub fn read_entry_with_suffix(&mut self, suffix: &str) -> Result<Option<Vec<u8>>> {
        match self.find_entry(suffix)? {
            Some(name) => Ok(Some(self.read_entry(&name)?)),
            None => Ok(None),
        }
    }
}

fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
