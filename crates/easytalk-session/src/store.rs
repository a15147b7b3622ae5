use async_trait::async_trait;
use easytalk_core::{EasytalkError, EasytalkResult, PersistedContext};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Durable per-caller conversation context.
///
/// `load` never fails: anything unreadable is treated as "no prior context".
/// `save` must fail loudly, since a lost write breaks conversational continuity.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn load(&self, caller_id: &str) -> PersistedContext;
    async fn save(&self, caller_id: &str, context: &PersistedContext) -> EasytalkResult<()>;

    async fn clear(&self, caller_id: &str) -> EasytalkResult<()> {
        self.save(caller_id, &PersistedContext::default()).await
    }
}

// ---------------------------------------------------------------------------
// FileContextStore
// ---------------------------------------------------------------------------

/// One JSON document per caller under a directory.
pub struct FileContextStore {
    dir: PathBuf,
}

impl FileContextStore {
    pub async fn new(dir: PathBuf) -> EasytalkResult<Self> {
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            EasytalkError::PersistenceFailed(format!(
                "cannot create context dir '{}': {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    fn context_path(&self, caller_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(caller_id)))
    }
}

/// Map a caller id to a file stem that is safe on every platform and
/// injective: alphanumerics and `-` pass through, everything else is escaped.
fn file_stem(caller_id: &str) -> String {
    let mut stem = String::with_capacity(caller_id.len());
    for c in caller_id.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            stem.push(c);
        } else {
            stem.push_str(&format!("_{:x}_", c as u32));
        }
    }
    stem
}

#[async_trait]
impl ContextStore for FileContextStore {
    async fn load(&self, caller_id: &str) -> PersistedContext {
        let path = self.context_path(caller_id);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(caller_id = %caller_id, "No stored context");
                return PersistedContext::default();
            }
            Err(e) => {
                warn!(caller_id = %caller_id, error = %e, "Failed to read context, starting empty");
                return PersistedContext::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(caller_id = %caller_id, error = %e, "Corrupt context file, starting empty");
                PersistedContext::default()
            }
        }
    }

    async fn save(&self, caller_id: &str, context: &PersistedContext) -> EasytalkResult<()> {
        let path = self.context_path(caller_id);
        let json = serde_json::to_string_pretty(context)
            .map_err(|e| EasytalkError::PersistenceFailed(e.to_string()))?;

        // Write then rename so a crash never leaves a half-written document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            EasytalkError::PersistenceFailed(format!("write '{}': {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            EasytalkError::PersistenceFailed(format!("rename to '{}': {e}", path.display()))
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryContextStore
// ---------------------------------------------------------------------------

/// Process-local store for tests and ephemeral deployments.
#[derive(Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, PersistedContext>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn load(&self, caller_id: &str) -> PersistedContext {
        self.contexts
            .read()
            .await
            .get(caller_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn save(&self, caller_id: &str, context: &PersistedContext) -> EasytalkResult<()> {
        self.contexts
            .write()
            .await
            .insert(caller_id.to_string(), context.clone());
        Ok(())
    }
}
