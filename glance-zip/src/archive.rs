use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::compression;
use crate::ArchiveError;

const LOCAL_HEADER_MAGIC: u32 = 0x0403_4b50;
const DIRECTORY_HEADER_MAGIC: u32 = 0x0201_4b50;
const END_OF_DIRECTORY_MAGIC: u32 = 0x0605_4b50;

/// Fixed part of the end-of-central-directory record; a variable-length
/// archive comment of up to u16::MAX bytes may follow it.
const END_OF_DIRECTORY_SIZE: u64 = 22;
const MAX_COMMENT_SIZE: u64 = u16::MAX as u64;

/// A readable ZIP archive. Opening parses the central directory; entry data
/// is only read (and decompressed) on demand.
pub struct Archive<R> {
    reader: R,
    entries: Vec<Entry>,
}

/// One central-directory entry. Directory placeholders (names ending in `/`)
/// are listed but carry no data.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    size: u32,
    header_offset: u32,
}

impl Entry {
    /// Full slash-separated path of the entry inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size as recorded in the central directory.
    pub fn size(&self) -> u64 {
        self.size as u64
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

impl Archive<Cursor<Vec<u8>>> {
    /// Convenience for archives that are already fully in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Archive::open(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> Archive<R> {
    pub fn open(mut reader: R) -> Result<Self, ArchiveError> {
        let (entry_count, directory_offset) = Self::locate_directory(&mut reader)?;

        reader.seek(SeekFrom::Start(directory_offset))?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(Self::read_directory_entry(&mut reader)?);
        }

        Ok(Archive { reader, entries })
    }

    /// Entries in central-directory order. That order is also the extraction
    /// order callers iterate in, so downstream consumers inherit it.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Extracts the entry at `index` into an owned buffer and verifies its
    /// CRC against the central-directory record.
    pub fn read(&mut self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        let entry = self.entries[index].clone();

        self.reader.seek(SeekFrom::Start(entry.header_offset as u64))?;
        let signature = self.reader.read_u32::<LittleEndian>()?;
        if signature != LOCAL_HEADER_MAGIC {
            return Err(ArchiveError::InvalidSignature { signature });
        }

        // The local header repeats most directory fields, but when the writer
        // streamed the entry (data-descriptor flag) its sizes are zero. The
        // central directory is authoritative either way, so only the name and
        // extra lengths are needed: they position us at the entry data.
        self.reader.seek(SeekFrom::Current(22))?;
        let name_length = self.reader.read_u16::<LittleEndian>()? as i64;
        let extra_length = self.reader.read_u16::<LittleEndian>()? as i64;
        self.reader.seek(SeekFrom::Current(name_length + extra_length))?;

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact(&mut compressed)?;
        let data = compression::decompress(entry.method, &compressed, entry.size as usize)?;

        let mut crc = flate2::Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(ArchiveError::ChecksumMismatch { name: entry.name });
        }

        Ok(data)
    }

    pub fn read_by_name(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| ArchiveError::EntryNotFound { name: name.to_owned() })?;
        self.read(index)
    }

    /// Finds the end-of-central-directory record and returns the entry count
    /// and the byte offset of the central directory.
    fn locate_directory(reader: &mut R) -> Result<(u16, u64), ArchiveError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < END_OF_DIRECTORY_SIZE {
            return Err(ArchiveError::MissingEndOfDirectory);
        }

        let tail_size = (END_OF_DIRECTORY_SIZE + MAX_COMMENT_SIZE).min(file_size);
        reader.seek(SeekFrom::Start(file_size - tail_size))?;
        let mut tail = vec![0u8; tail_size as usize];
        reader.read_exact(&mut tail)?;

        // The record sits before the (optional) archive comment, so scan
        // backwards for the first magic from the end.
        let mut position = tail.len() - END_OF_DIRECTORY_SIZE as usize;
        loop {
            if tail[position..position + 4] == END_OF_DIRECTORY_MAGIC.to_le_bytes() {
                let mut record = &tail[position + 4..];
                let _disk_number = record.read_u16::<LittleEndian>()?;
                let directory_disk = record.read_u16::<LittleEndian>()?;
                let _disk_entries = record.read_u16::<LittleEndian>()?;
                let entry_count = record.read_u16::<LittleEndian>()?;
                let _directory_size = record.read_u32::<LittleEndian>()?;
                let directory_offset = record.read_u32::<LittleEndian>()?;

                if directory_disk != 0 {
                    return Err(ArchiveError::FormatError {
                        reason: "multi-disk archives are not supported",
                    });
                }
                if entry_count == u16::MAX || directory_offset == u32::MAX {
                    return Err(ArchiveError::FormatError {
                        reason: "ZIP64 archives are not supported",
                    });
                }

                return Ok((entry_count, directory_offset as u64));
            }

            if position == 0 {
                return Err(ArchiveError::MissingEndOfDirectory);
            }
            position -= 1;
        }
    }

    fn read_directory_entry(reader: &mut R) -> Result<Entry, ArchiveError> {
        let signature = reader.read_u32::<LittleEndian>()?;
        if signature != DIRECTORY_HEADER_MAGIC {
            return Err(ArchiveError::InvalidSignature { signature });
        }

        let _version_made_by = reader.read_u16::<LittleEndian>()?;
        let _version_needed = reader.read_u16::<LittleEndian>()?;
        let _flags = reader.read_u16::<LittleEndian>()?;
        let method = reader.read_u16::<LittleEndian>()?;
        let _modified_time = reader.read_u16::<LittleEndian>()?;
        let _modified_date = reader.read_u16::<LittleEndian>()?;
        let crc32 = reader.read_u32::<LittleEndian>()?;
        let compressed_size = reader.read_u32::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let name_length = reader.read_u16::<LittleEndian>()? as usize;
        let extra_length = reader.read_u16::<LittleEndian>()? as usize;
        let comment_length = reader.read_u16::<LittleEndian>()? as usize;
        let _disk_start = reader.read_u16::<LittleEndian>()?;
        let _internal_attributes = reader.read_u16::<LittleEndian>()?;
        let _external_attributes = reader.read_u32::<LittleEndian>()?;
        let header_offset = reader.read_u32::<LittleEndian>()?;

        let mut name = vec![0u8; name_length];
        reader.read_exact(&mut name)?;
        // Names are CP437 or UTF-8 depending on a flag bit. Non-UTF-8 names
        // have become rare enough that the lossy route beats carrying a
        // codepage table.
        let name = String::from_utf8_lossy(&name).into_owned();

        reader.seek(SeekFrom::Current((extra_length + comment_length) as i64))?;

        Ok(Entry {
            name,
            method,
            crc32,
            compressed_size,
            size,
            header_offset,
        })
    }
}
