//! JSON file-backed subscription store with atomic writes.

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    tokio::fs,
    tracing::{debug, info, warn},
};

use crate::{Result, store::SubscriptionStore, types::Document};

/// File-backed store. The whole document is one JSON object.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path><suffix>`, next to the store file.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| OsString::from("subscriptions.json"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Atomic write: write to temp, rename over target.
    async fn atomic_write(&self, doc: &Document) -> Result<()> {
        self.ensure_parent().await?;
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.sibling(".tmp");

        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Move an unreadable document aside so the next save does not destroy it.
    async fn quarantine(&self) {
        let corrupt = self.sibling(".corrupt");
        match fs::rename(&self.path, &corrupt).await {
            Ok(()) => warn!(
                path = %self.path.display(),
                moved_to = %corrupt.display(),
                "subscription store was unreadable, starting empty"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to move unreadable subscription store aside"
            ),
        }
    }
}

fn decode(bytes: &[u8]) -> serde_json::Result<Document> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::default());
    }
    serde_json::from_slice(bytes)
}

impl FileStore {
    /// Raw file content, or `None` when the file does not exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the document without touching the filesystem.
    ///
    /// Unlike [`SubscriptionStore::load`] a missing file is not created and an
    /// unparseable one is reported as [`Error::Json`](crate::Error::Json)
    /// instead of being moved aside.
    pub async fn peek(&self) -> Result<Option<Document>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SubscriptionStore for FileStore {
    async fn load(&self) -> Result<Document> {
        let Some(bytes) = self.read_bytes().await? else {
            info!(path = %self.path.display(), "creating empty subscription store");
            let doc = Document::default();
            self.atomic_write(&doc).await?;
            return Ok(doc);
        };

        match decode(&bytes) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse subscription store");
                self.quarantine().await;
                Ok(Document::default())
            },
        }
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        self.atomic_write(doc).await?;
        debug!(path = %self.path.display(), subscribers = doc.len(), "saved subscription store");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, courier_common::Snowflake, tempfile::TempDir};

    fn id(s: &str) -> Snowflake {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn load_missing_creates_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("db.json");
        let store = FileStore::new(&path);

        let doc = store.load().await.unwrap();
        assert!(doc.is_empty());

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk.trim(), "{}");
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("db.json"));

        let mut doc = Document::new();
        doc.record_mut(&id("1"))
            .add(id("340282366920938463463374607431768211457"));
        doc.record_mut(&id("2")).add(id("9007199254740993"));
        doc.record_mut(&id("3"));
        store.save(&doc).await.unwrap();

        assert_eq!(store.load().await.unwrap(), doc);
        assert!(!tmp.path().join("db.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("db.json"));

        let mut first = Document::new();
        first.record_mut(&id("1")).add(id("10"));
        store.save(&first).await.unwrap();

        let second = Document::new();
        store.save(&second).await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_files_written_by_older_versions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, r#"{"100":{"subscribed":["123","456"]}}"#).unwrap();

        let doc = FileStore::new(&path).load().await.unwrap();
        let record = doc.get("100").unwrap();
        assert_eq!(record.subscribed, vec![id("123"), id("456")]);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_and_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "{not json").unwrap();

        let doc = FileStore::new(&path).load().await.unwrap();
        assert!(doc.is_empty());

        let kept = std::fs::read_to_string(tmp.path().join("db.json.corrupt")).unwrap();
        assert_eq!(kept, "{not json");
    }

    #[tokio::test]
    async fn non_utf8_file_is_treated_as_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();

        let store = FileStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(
            std::fs::read(tmp.path().join("db.json.corrupt")).unwrap(),
            vec![0xff, 0xfe, b'{', b'}']
        );

        // The next load sees a fresh store instead of failing again.
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_user_keys_do_not_discard_the_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(
            &path,
            r#"{"100":{"subscribed":["123"]},"abc":{"subscribed":["456"]}}"#,
        )
        .unwrap();

        let doc = FileStore::new(&path).load().await.unwrap();
        assert_eq!(doc.len(), 2);
        assert!(!tmp.path().join("db.json.corrupt").exists());
    }

    #[tokio::test]
    async fn peek_leaves_missing_and_corrupt_files_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let store = FileStore::new(&path);

        assert!(store.peek().await.unwrap().is_none());
        assert!(!path.exists());

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(store.peek().await, Err(crate::Error::Json(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
        assert!(!tmp.path().join("db.json.corrupt").exists());
    }

    #[tokio::test]
    async fn blank_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "  \n").unwrap();

        assert!(FileStore::new(&path).load().await.unwrap().is_empty());
        assert!(!tmp.path().join("db.json.corrupt").exists());
    }

    #[tokio::test]
    async fn unreadable_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        // A directory where the file should be: reading fails with something
        // other than NotFound.
        let path = tmp.path().join("db.json");
        std::fs::create_dir(&path).unwrap();

        assert!(FileStore::new(&path).load().await.is_err());
    }
}
