//! JSONL journal source: `<dir>/<source_name>.jsonl`, one [`RawEvent`] per line.
//!
//! Writers only ever append. A handle remembers the byte offset of the last complete line it
//! consumed and the identity of the file it was read from. A different file at the same path, or
//! one shorter than that offset, has been rotated and is read again from the start.

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use warden_types::{EventHandle, EventSource, EventSourceError, RawEvent, ReadDirection};

pub struct JournalEventSource {
    dir: PathBuf,
}

impl JournalEventSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, source_name: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", source_name))
    }
}

#[async_trait]
impl EventSource for JournalEventSource {
    async fn open(&self, source_name: &str) -> Result<Box<dyn EventHandle>, EventSourceError> {
        let path = self.path_for(source_name);
        let identity = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => file_identity(&meta),
            Ok(_) => {
                return Err(EventSourceError::Open {
                    name: source_name.to_string(),
                    reason: format!("{} is not a file", path.display()),
                })
            }
            Err(e) => {
                return Err(EventSourceError::Open {
                    name: source_name.to_string(),
                    reason: format!("{}: {}", path.display(), e),
                })
            }
        };
        Ok(Box::new(JournalHandle {
            path,
            offset: 0,
            identity,
        }))
    }
}

/// Read position within one journal file.
pub struct JournalHandle {
    path: PathBuf,
    offset: u64,
    identity: Option<(u64, u64)>,
}

/// `(device, inode)` of a journal file.
#[cfg(unix)]
fn file_identity(meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_identity(_meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}

#[async_trait]
impl EventHandle for JournalHandle {
    async fn read(&mut self, direction: ReadDirection) -> Result<Vec<RawEvent>, EventSourceError> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        let meta = file.metadata().await?;
        let len = meta.len();
        let identity = file_identity(&meta);
        if identity != self.identity {
            tracing::warn!(path = %self.path.display(), "journal replaced; rereading from start");
            self.identity = identity;
            self.offset = 0;
        } else if len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                "journal shrank from {} to {} bytes; rereading from start",
                self.offset,
                len
            );
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut buf).await?;

        // A trailing line without a newline is still being written.
        let complete = match buf.iter().rposition(|b| *b == b'\n') {
            Some(pos) => pos + 1,
            None => return Ok(Vec::new()),
        };
        self.offset += complete as u64;

        let mut events = Vec::new();
        for line in buf[..complete].split(|b| *b == b'\n') {
            let line = String::from_utf8_lossy(line);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEvent>(line) {
                Ok(ev) => events.push(ev),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "skipping malformed journal line: {}", e)
                }
            }
        }
        if direction == ReadDirection::Backwards {
            events.reverse();
        }
        Ok(events)
    }
}
