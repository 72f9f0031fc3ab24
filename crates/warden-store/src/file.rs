//! Text-file record store: `<dir>/<principal>.txt`, one `[timestamp] ACTION` line per record.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use warden_types::{LogRecord, RecordStore, RecordStoreError, UNKNOWN_PRINCIPAL};

/// Appends each record to its principal's file and closes it again before returning.
pub struct FileRecordStore {
    dir: PathBuf,
    append_lock: tokio::sync::Mutex<()>,
}

impl FileRecordStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// File that holds `principal`'s records.
    pub fn path_for(&self, principal: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", sanitize_principal(principal)))
    }
}

/// Make a principal safe to use as a file name inside the log directory.
///
/// Path separators, drive and wildcard characters, control characters and `%` itself are written
/// as `%XX` per UTF-8 byte, so distinct principals never share a file. A name made only of dots
/// has its dots escaped too. Blank names map to the unknown principal.
pub fn sanitize_principal(principal: &str) -> String {
    if principal.trim().is_empty() {
        return UNKNOWN_PRINCIPAL.to_string();
    }
    let dots_only = principal.chars().all(|c| c == '.');
    let mut out = String::with_capacity(principal.len());
    for c in principal.chars() {
        let escape = match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%' => true,
            '.' => dots_only,
            c => c.is_control(),
        };
        if escape {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", b));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RecordStoreError {
    let path = path.to_path_buf();
    move |source| RecordStoreError::Io { path, source }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn append(&self, record: &LogRecord) -> Result<(), RecordStoreError> {
        let _guard = self.append_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))?;

        let path = self.path_for(&record.principal);
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_error(&path))?;
        f.write_all(format!("{}\n", record.line()).as_bytes())
            .await
            .map_err(io_error(&path))?;
        f.flush().await.map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), "appended {}", record.action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use warden_types::SessionAction;

    fn record(principal: &str, action: SessionAction, minute: u32) -> LogRecord {
        let ts = Local.with_ymd_and_hms(2024, 5, 2, 9, minute, 0).unwrap();
        LogRecord::new(principal, action, ts)
    }

    #[tokio::test]
    async fn creates_directory_and_appends_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let store = FileRecordStore::new(&dir);

        store
            .append(&record("alice", SessionAction::SessionStart, 1))
            .await
            .unwrap();
        store
            .append(&record("alice", SessionAction::SessionEnd, 2))
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.join("alice.txt")).unwrap();
        assert_eq!(
            content,
            "[2024-05-02 09:01:00] LOGIN\n[2024-05-02 09:02:00] LOGOUT\n"
        );
    }

    #[tokio::test]
    async fn earlier_content_is_always_a_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(tmp.path());
        let path = store.path_for("bob");
        let mut previous = String::new();
        for minute in 0..6 {
            let action = if minute % 2 == 0 {
                SessionAction::SessionStart
            } else {
                SessionAction::SessionEnd
            };
            store.append(&record("bob", action, minute)).await.unwrap();
            let now = std::fs::read_to_string(&path).unwrap();
            assert!(now.len() > previous.len());
            assert!(now.starts_with(&previous));
            previous = now;
        }
        assert_eq!(previous.lines().count(), 6);
    }

    #[tokio::test]
    async fn failed_write_does_not_block_other_principals() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(tmp.path());
        // A directory in place of alice.txt makes alice's append fail.
        std::fs::create_dir(store.path_for("alice")).unwrap();

        let err = store
            .append(&record("alice", SessionAction::SessionStart, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordStoreError::Io { ref path, .. } if path.ends_with("alice.txt")));

        store
            .append(&record("bob", SessionAction::SessionStart, 2))
            .await
            .unwrap();
        let content = std::fs::read_to_string(store.path_for("bob")).unwrap();
        assert_eq!(content, "[2024-05-02 09:02:00] LOGIN\n");
    }

    #[tokio::test]
    async fn principals_cannot_escape_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let store = FileRecordStore::new(&dir);
        store
            .append(&record("../../etc/passwd", SessionAction::SessionStart, 1))
            .await
            .unwrap();
        let entries: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["..%2F..%2Fetc%2Fpasswd.txt".to_string()]);
    }

    #[test]
    fn sanitizes_principals() {
        assert_eq!(sanitize_principal("jdoe"), "jdoe");
        assert_eq!(sanitize_principal("CORP\\jdoe"), "CORP%5Cjdoe");
        assert_eq!(sanitize_principal("a/b:c"), "a%2Fb%3Ac");
        assert_eq!(sanitize_principal("tab\there"), "tab%09here");
        assert_eq!(sanitize_principal("50%"), "50%25");
        assert_eq!(sanitize_principal(".."), "%2E%2E");
        assert_eq!(sanitize_principal("   "), UNKNOWN_PRINCIPAL);
        assert_eq!(sanitize_principal("Dr. Who"), "Dr. Who");
    }

    #[tokio::test]
    async fn similar_principals_get_separate_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(tmp.path());
        for (principal, minute) in [("a/b", 1), ("a_b", 2), ("a%2Fb", 3)] {
            store
                .append(&record(principal, SessionAction::SessionStart, minute))
                .await
                .unwrap();
        }
        let mut entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["a%252Fb.txt", "a%2Fb.txt", "a_b.txt"]);
    }
}
