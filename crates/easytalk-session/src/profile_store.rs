use async_trait::async_trait;
use easytalk_core::{EasytalkError, EasytalkResult, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: &str) -> EasytalkResult<Option<UserProfile>>;
    /// Validate and insert, replacing any profile with the same id.
    async fn put(&self, profile: &UserProfile) -> EasytalkResult<()>;
    async fn list(&self) -> EasytalkResult<Vec<UserProfile>>;
}

/// On-disk document: `{"users": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfilesDocument {
    #[serde(default)]
    users: Vec<UserProfile>,
}

// ---------------------------------------------------------------------------
// FileProfileStore
// ---------------------------------------------------------------------------

/// All profiles in a single JSON file.
pub struct FileProfileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles of `put`.
    write_lock: Mutex<()>,
}

impl FileProfileStore {
    pub async fn new(path: PathBuf) -> EasytalkResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn read_document(&self) -> EasytalkResult<ProfilesDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ProfilesDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, doc: &ProfilesDocument) -> EasytalkResult<()> {
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| EasytalkError::PersistenceFailed(format!("write profiles: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| EasytalkError::PersistenceFailed(format!("rename profiles: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn get(&self, id: &str) -> EasytalkResult<Option<UserProfile>> {
        let doc = self.read_document().await?;
        Ok(doc.users.into_iter().find(|u| u.id == id))
    }

    async fn put(&self, profile: &UserProfile) -> EasytalkResult<()> {
        profile.validate()?;
        let _guard = self.write_lock.lock().await;

        let mut doc = self.read_document().await?;
        match doc.users.iter_mut().find(|u| u.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => doc.users.push(profile.clone()),
        }
        self.write_document(&doc).await?;
        info!(profile_id = %profile.id, "Profile saved");
        Ok(())
    }

    async fn list(&self) -> EasytalkResult<Vec<UserProfile>> {
        Ok(self.read_document().await?.users)
    }
}

// ---------------------------------------------------------------------------
// InMemoryProfileStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            profiles: RwLock::new(map),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, id: &str) -> EasytalkResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn put(&self, profile: &UserProfile) -> EasytalkResult<()> {
        profile.validate()?;
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn list(&self) -> EasytalkResult<Vec<UserProfile>> {
        let mut profiles: Vec<UserProfile> = self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }
}
