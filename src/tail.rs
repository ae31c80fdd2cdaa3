//! Tailing the live data file.
//!
//! The producer only ever appends, so the consumer remembers how many bytes it
//! has already consumed and reads from there on each poll. Only complete,
//! newline-terminated lines are handed out; a line the producer is still
//! writing stays in the file until the next poll.

use std::collections::VecDeque;
use std::fs::{File, Metadata};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::broker::MessageSource;
use crate::error::Result;

/// Longest prefix of the first line kept to recognize a file
const HEAD_LEN: usize = 256;

/// Which file an offset belongs to
///
/// The producer deletes and recreates the live data file on restart. An offset
/// into the old file means nothing in the new one, so each read checks that
/// the inode and the start of the first line are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIdentity {
    inode: Option<u64>,
    head: Vec<u8>,
}

impl FileIdentity {
    fn matches(&self, inode: Option<u64>, file: &mut File, len: u64) -> std::io::Result<bool> {
        if let (Some(known), Some(current)) = (self.inode, inode) {
            if known != current {
                return Ok(false);
            }
        }
        if self.head.is_empty() {
            return Ok(true);
        }
        if len < self.head.len() as u64 {
            return Ok(false);
        }

        let mut head = vec![0; self.head.len()];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut head)?;
        Ok(head == self.head)
    }
}

#[cfg(unix)]
fn inode(metadata: &Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
const fn inode(_metadata: &Metadata) -> Option<u64> {
    None
}

/// Result of one read from the tail of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailRead {
    /// Complete, non-blank lines without their terminators
    pub lines: Vec<Vec<u8>>,
    /// Offset to pass to the next read
    pub next_offset: u64,
    /// Identity to pass to the next read
    pub identity: FileIdentity,
}

/// Read the complete lines appended to `path` since `offset`
///
/// Reading restarts from the beginning when the file is shorter than
/// `offset`, or when it is no longer the file `known` describes. Lines are
/// returned as raw bytes; decoding is left to the caller.
pub fn read_new_lines(path: &Path, offset: u64, known: Option<&FileIdentity>) -> std::io::Result<TailRead> {
    let mut file = File::open(path)?;
    let metadata = file.metadata()?;
    let len = metadata.len();
    let inode = inode(&metadata);

    let same = match known {
        Some(identity) => identity.matches(inode, &mut file, len)?,
        None => true,
    };

    let start = if len < offset {
        warn!(path = %path.display(), offset, len, "Live data file shrank, reading from the start");
        0
    } else if !same && offset > 0 {
        warn!(path = %path.display(), offset, "Live data file was replaced, reading from the start");
        0
    } else {
        offset
    };

    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    let complete = buf.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
    let lines = buf[..complete]
        .split(|b| *b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|line| !line.is_empty())
        .map(<[u8]>::to_vec)
        .collect();

    let head = match known {
        Some(identity) if start > 0 => identity.head.clone(),
        _ if start == 0 => {
            let first = buf[..complete].iter().position(|b| *b == b'\n').map_or(0, |i| i + 1);
            buf[..first.min(HEAD_LEN)].to_vec()
        },
        _ => Vec::new(),
    };

    Ok(TailRead {
        lines,
        next_offset: start + complete as u64,
        identity: FileIdentity { inode, head },
    })
}

/// Message source that follows a growing file
#[derive(Debug)]
pub struct FileTail {
    path: PathBuf,
    offset: u64,
    identity: Option<FileIdentity>,
    pending: VecDeque<Vec<u8>>,
}

impl FileTail {
    /// Follow `path` from its beginning
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_offset(path, 0)
    }

    /// Follow `path` starting at a byte offset recorded earlier
    #[must_use]
    pub fn with_offset(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            identity: None,
            pending: VecDeque::new(),
        }
    }

    /// Bytes consumed so far
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// File being followed
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSource for FileTail {
    fn next_payload(&mut self, wait: Duration) -> Result<Option<Vec<u8>>> {
        if let Some(line) = self.pending.pop_front() {
            return Ok(Some(line));
        }

        let read = read_new_lines(&self.path, self.offset, self.identity.as_ref())?;
        if !read.lines.is_empty() {
            debug!(lines = read.lines.len(), offset = read.next_offset, "Read new lines");
        }
        self.offset = read.next_offset;
        self.identity = Some(read.identity);
        self.pending.extend(read.lines);

        match self.pending.pop_front() {
            Some(line) => Ok(Some(line)),
            None => {
                if !wait.is_zero() {
                    std::thread::sleep(wait);
                }
                Ok(None)
            },
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    fn append(path: &Path, text: &[u8]) {
        let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
        file.write_all(text).unwrap();
    }

    fn lines(read: &TailRead) -> Vec<&[u8]> {
        read.lines.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn test_partial_line_is_held_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        append(&path, b"first\nsecond\nthi");

        let read = read_new_lines(&path, 0, None).unwrap();
        assert_eq!(lines(&read), vec![&b"first"[..], &b"second"[..]]);
        assert_eq!(read.next_offset, 13);

        append(&path, b"rd\n");
        let read = read_new_lines(&path, read.next_offset, Some(&read.identity)).unwrap();
        assert_eq!(lines(&read), vec![&b"third"[..]]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        append(&path, b"a\n\n  \r\nb\r\n");

        let read = read_new_lines(&path, 0, None).unwrap();
        assert_eq!(lines(&read), vec![&b"a"[..], &b"b"[..]]);
    }

    #[test]
    fn test_truncated_file_restarts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        append(&path, b"one\ntwo\n");
        let read = read_new_lines(&path, 0, None).unwrap();

        std::fs::remove_file(&path).unwrap();
        append(&path, b"x\n");
        let read = read_new_lines(&path, read.next_offset, Some(&read.identity)).unwrap();
        assert_eq!(lines(&read), vec![&b"x"[..]]);
        assert_eq!(read.next_offset, 2);
    }

    #[test]
    fn test_recreated_longer_file_restarts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        let old = b"{\"author\":\"Bob\",\"category\":\"skiing\",\"text\":\"ok\"}\n";
        append(&path, old);
        let read = read_new_lines(&path, 0, None).unwrap();
        assert_eq!(read.next_offset, old.len() as u64);

        std::fs::remove_file(&path).unwrap();
        let new = b"{\"author\":\"Judy\",\"category\":\"museum\",\"text\":\"a cozy afternoon at the museum\"}\n";
        assert!(new.len() > old.len());
        append(&path, new);

        let read = read_new_lines(&path, read.next_offset, Some(&read.identity)).unwrap();
        assert_eq!(lines(&read), vec![&new[..new.len() - 1]]);
        assert_eq!(read.next_offset, new.len() as u64);
    }

    #[test]
    fn test_same_file_keeps_its_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        append(&path, b"one\n");
        let first = read_new_lines(&path, 0, None).unwrap();

        append(&path, b"two\n");
        let second = read_new_lines(&path, first.next_offset, Some(&first.identity)).unwrap();
        assert_eq!(lines(&second), vec![&b"two"[..]]);
        assert_eq!(second.identity, first.identity);
    }

    #[test]
    fn test_invalid_utf8_is_passed_through_as_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        append(&path, b"ok\n\xff\xfe\n");

        let read = read_new_lines(&path, 0, None).unwrap();
        assert_eq!(lines(&read), vec![&b"ok"[..], &b"\xff\xfe"[..]]);
    }

    #[test]
    fn test_missing_file_is_an_error_then_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.jsonl");
        let mut tail = FileTail::new(&path);

        assert!(tail.next_payload(Duration::ZERO).is_err());

        append(&path, b"hello\n");
        assert_eq!(tail.next_payload(Duration::ZERO).unwrap().as_deref(), Some(&b"hello"[..]));
        assert_eq!(tail.next_payload(Duration::ZERO).unwrap(), None);
        assert_eq!(tail.offset(), 6);
    }
}
