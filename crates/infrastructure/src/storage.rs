use shared::ClientError;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// 永続化キー: ユーザー情報（JSON）
pub const USER_KEY: &str = "user";
/// 永続化キー: ユーザー名
pub const USERNAME_KEY: &str = "username";
/// 永続化キー: パスワード（平文）
pub const PASSWORD_KEY: &str = "password";

/// セッションを保存するキー/バリューストア
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// プロセス内だけで保持するストア（テスト/一時利用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されているキーの一覧
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// JSON ファイルに保存するストア
///
/// 毎回ファイルを読み直すため、他プロセスの書き込みも反映される。
/// プロセス間のロックは取らない。
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイルの内容（存在しなければ None）
    fn read(&self) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parse(&self, content: &str) -> Result<BTreeMap<String, String>, ClientError> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(content)
            .map_err(|e| ClientError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn load(&self) -> Result<BTreeMap<String, String>, ClientError> {
        match self.read()? {
            Some(content) => self.parse(&content),
            None => Ok(BTreeMap::new()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        // 壊れたファイルは空として扱い、書き込みで置き換える
        let (mut entries, replace) = match self.read()? {
            Some(content) => match self.parse(&content) {
                Ok(entries) => (entries, false),
                Err(e) => {
                    warn!(error = %e, "replacing unreadable session file");
                    (BTreeMap::new(), true)
                }
            },
            None => (BTreeMap::new(), false),
        };
        if change(&mut entries) || replace {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        // キーが無ければファイルを作らない
        self.update(|entries| entries.remove(key).is_some())
    }
}
