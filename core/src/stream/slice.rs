//! Presents the installer's data region — embedded in the setup executable
//! or split across external `-1.bin`, `-2.bin`, … files — as one forward-only
//! byte source. At most one slice file is open at any time.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LE, ReadBytesExt};
use log::debug;

use crate::error::{InnoError, Result};

const SLICE_IDS: [&[u8; 8]; 2] = [b"idska16\x1a", b"idska32\x1a"];

/// Highest sensible slices-per-disk value: slice letters run 'a'..='z'.
pub const MAX_SLICES_PER_DISK: usize = 26;

enum Source {
    /// Data follows the setup executable at a fixed offset.
    Embedded { path: PathBuf, data_offset: u64 },
    /// Data lives in a family of external slice files.
    External {
        dirs: Vec<PathBuf>,
        base_file: String,
        slices_per_disk: usize,
    },
}

pub struct SliceReader {
    source: Source,
    file: Option<BufReader<File>>,
    current_slice: usize,
    /// Valid byte count of the open slice, counted from the start of the
    /// file (external slices include their 12-byte header in this).
    slice_size: u64,
    /// Read position within the open slice file.
    pos: u64,
}

impl SliceReader {
    /// Single-file setup: the data region starts at `data_offset` and runs to
    /// the end of the file. Cross-slice operations are errors in this mode.
    pub fn embedded(path: &Path, data_offset: u32) -> Result<Self> {
        let mut reader = SliceReader {
            source: Source::Embedded {
                path: path.to_path_buf(),
                data_offset: u64::from(data_offset),
            },
            file: None,
            current_slice: 0,
            slice_size: 0,
            pos: 0,
        };
        reader.open_slice(0)?;
        Ok(reader)
    }

    /// Multi-file setup. Slice files are looked up first next to the
    /// installer, then in the optional override directory.
    pub fn external(
        dirs: Vec<PathBuf>,
        base_file: String,
        slices_per_disk: usize,
    ) -> Result<Self> {
        if slices_per_disk == 0 || slices_per_disk > MAX_SLICES_PER_DISK {
            return Err(InnoError::SliceSizeOverflow {
                size: slices_per_disk as u64,
                limit: MAX_SLICES_PER_DISK as u64,
            });
        }
        Ok(SliceReader {
            source: Source::External {
                dirs,
                base_file,
                slices_per_disk,
            },
            file: None,
            current_slice: 0,
            slice_size: 0,
            pos: 0,
        })
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.source, Source::Embedded { .. })
    }

    /// `{base}-{disk}{letter}.bin`, or `{base}-{n}.bin` for one slice per
    /// disk.
    fn slice_file_name(base: &str, slice: usize, slices_per_disk: usize) -> String {
        if slices_per_disk == 1 {
            format!("{base}-{}.bin", slice + 1)
        } else {
            let disk = slice / slices_per_disk + 1;
            let letter = (b'a' + (slice % slices_per_disk) as u8) as char;
            format!("{base}-{disk}{letter}.bin")
        }
    }

    fn open_slice(&mut self, slice: usize) -> Result<()> {
        self.file = None;

        match &self.source {
            Source::Embedded { path, data_offset } => {
                if slice != 0 {
                    return Err(InnoError::SliceMissing(path.clone()));
                }
                let file = File::open(path).map_err(|_| InnoError::SliceMissing(path.clone()))?;
                let file_size = file.metadata()?.len();
                let mut reader = BufReader::new(file);
                reader.seek(SeekFrom::Start(*data_offset))?;
                self.slice_size = file_size;
                self.pos = *data_offset;
                self.file = Some(reader);
            }
            Source::External {
                dirs,
                base_file,
                slices_per_disk,
            } => {
                let name = Self::slice_file_name(base_file, slice, *slices_per_disk);
                let path = dirs
                    .iter()
                    .map(|dir| dir.join(&name))
                    .find(|p| p.is_file())
                    .ok_or_else(|| InnoError::SliceMissing(PathBuf::from(&name)))?;

                debug!("[slice] opening {}", path.display());
                let file = File::open(&path).map_err(|_| InnoError::SliceMissing(path.clone()))?;
                let file_size = file.metadata()?.len();
                let mut reader = BufReader::new(file);

                let mut magic = [0u8; 8];
                reader
                    .read_exact(&mut magic)
                    .map_err(|_| InnoError::SliceMagicBad(path.clone()))?;
                if !SLICE_IDS.iter().any(|id| **id == magic) {
                    return Err(InnoError::SliceMagicBad(path.clone()));
                }

                let slice_size = u64::from(reader.read_u32::<LE>().map_err(InnoError::from_read)?);
                if slice_size > file_size {
                    return Err(InnoError::SliceSizeOverflow {
                        size: slice_size,
                        limit: file_size,
                    });
                }

                self.slice_size = slice_size;
                self.pos = 12;
                self.file = Some(reader);
            }
        }

        self.current_slice = slice;
        Ok(())
    }

    /// Positions the reader at `offset` within the given slice's data.
    pub fn seek(&mut self, slice: usize, offset: u32) -> Result<()> {
        if self.file.is_none() || slice != self.current_slice {
            self.open_slice(slice)?;
        }

        let base = match &self.source {
            Source::Embedded { data_offset, .. } => *data_offset,
            Source::External { .. } => 0,
        };
        let target = base + u64::from(offset);
        if target > self.slice_size {
            return Err(InnoError::Truncated);
        }
        self.file
            .as_mut()
            .expect("opened above")
            .seek(SeekFrom::Start(target))?;
        self.pos = target;
        Ok(())
    }
}

impl Read for SliceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let Some(file) = self.file.as_mut() else {
                return Err(InnoError::Truncated.into_io());
            };
            let remaining = self.slice_size.saturating_sub(self.pos);
            if remaining == 0 {
                if self.is_embedded() {
                    return Ok(0);
                }
                let next = self.current_slice + 1;
                self.open_slice(next).map_err(InnoError::into_io)?;
                continue;
            }

            let cap = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let n = file.read(&mut buf[..cap])?;
            if n == 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.pos += n as u64;
            return Ok(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_names_follow_disk_letter_arithmetic() {
        assert_eq!(SliceReader::slice_file_name("setup", 0, 1), "setup-1.bin");
        assert_eq!(SliceReader::slice_file_name("setup", 2, 1), "setup-3.bin");
        assert_eq!(SliceReader::slice_file_name("setup", 0, 3), "setup-1a.bin");
        assert_eq!(SliceReader::slice_file_name("setup", 1, 3), "setup-1b.bin");
        assert_eq!(SliceReader::slice_file_name("setup", 3, 3), "setup-2a.bin");
    }

    #[test]
    fn too_many_slices_per_disk_rejected_at_plan_time() {
        let err = SliceReader::external(vec![PathBuf::from(".")], "setup".into(), 27);
        assert!(matches!(err, Err(InnoError::SliceSizeOverflow { .. })));
    }
}
