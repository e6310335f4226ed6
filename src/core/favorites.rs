use crate::core::write_queue::WriteQueue;
use crate::core::{IdentityPolicy, SelectionPersistence, StoreWarning, University};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// The user's favorite universities in the order they were added.
///
/// Mutations apply in memory first and are visible immediately; the new list
/// is then handed to the write queue without waiting for it to land.
pub struct FavoritesStore {
    persistence: Arc<dyn SelectionPersistence>,
    writes: WriteQueue,
    key: String,
    identity: IdentityPolicy,
    state: watch::Sender<Vec<Arc<University>>>,
    warnings: broadcast::Sender<StoreWarning>,
}

impl FavoritesStore {
    pub fn new(
        persistence: Arc<dyn SelectionPersistence>,
        key: impl Into<String>,
        identity: IdentityPolicy,
    ) -> Self {
        let (warnings, _) = broadcast::channel(16);
        let (state, _) = watch::channel(Vec::new());
        let writes = WriteQueue::spawn(persistence.clone(), warnings.clone());

        Self {
            persistence,
            writes,
            key: key.into(),
            identity,
            state,
            warnings,
        }
    }

    /// Hydrates from persistence. Unreadable or malformed data leaves the
    /// store as it is and is reported on the warning channel.
    ///
    /// Favorites added before hydration finishes are kept after the saved
    /// ones, unless the saved list already holds them.
    pub async fn initialize(&self) {
        let saved = match self.load_saved().await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Ignoring saved favorites: {}", e);
                let _ = self.warnings.send(StoreWarning::HydrationFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                });
                return;
            }
        };
        tracing::info!("Loaded {} favorites", saved.len());

        let identity = self.identity;
        let mut serialized = None;
        self.state.send_modify(|favorites| {
            let early = std::mem::take(favorites);
            let mut merged: Vec<Arc<University>> = saved.into_iter().map(Arc::new).collect();
            let hydrated = merged.len();
            for favorite in early {
                if !merged.iter().any(|f| identity.same(f, &favorite)) {
                    merged.push(favorite);
                }
            }
            if merged.len() > hydrated {
                serialized = Some(serialize(&merged));
            }
            *favorites = merged;
        });

        if let Some(result) = serialized {
            tracing::debug!("Merged favorites added before hydration");
            self.persist(result);
        }
    }

    async fn load_saved(&self) -> Result<Vec<University>> {
        match self.persistence.get(&self.key).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Adds `university` when absent, removes the first match otherwise.
    /// Returns whether it is a favorite afterwards.
    pub fn toggle_favorite(&self, university: &University) -> bool {
        let identity = self.identity;
        let mut now_favorite = false;
        let mut serialized = None;

        self.state.send_modify(|favorites| {
            match favorites.iter().position(|f| identity.same(f, university)) {
                Some(index) => {
                    favorites.remove(index);
                }
                None => {
                    favorites.push(Arc::new(university.clone()));
                    now_favorite = true;
                }
            }
            serialized = Some(serialize(favorites));
        });

        tracing::debug!(
            "{} favorite {:?}",
            if now_favorite { "Added" } else { "Removed" },
            university.name
        );

        if let Some(result) = serialized {
            self.persist(result);
        }

        now_favorite
    }

    fn persist(&self, serialized: Result<String>) {
        match serialized {
            Ok(json) => self.writes.enqueue(&self.key, json),
            Err(e) => {
                tracing::warn!("Could not serialize favorites: {}", e);
                let _ = self.warnings.send(StoreWarning::WriteFailed {
                    key: self.key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn is_favorite(&self, university: &University) -> bool {
        self.state
            .borrow()
            .iter()
            .any(|f| self.identity.same(f, university))
    }

    pub fn favorites(&self) -> Vec<Arc<University>> {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn identity(&self) -> IdentityPolicy {
        self.identity
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Arc<University>>> {
        self.state.subscribe()
    }

    pub fn warnings(&self) -> broadcast::Receiver<StoreWarning> {
        self.warnings.subscribe()
    }

    /// Waits for every favorites write issued so far.
    pub async fn flush(&self) {
        self.writes.flush().await;
    }
}

fn serialize(favorites: &[Arc<University>]) -> Result<String> {
    let records: Vec<&University> = favorites.iter().map(|f| f.as_ref()).collect();
    Ok(serde_json::to_string(&records)?)
}
