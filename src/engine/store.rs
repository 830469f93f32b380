use std::io;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{info, warn};

use crate::limits::WAL_CHANNEL_CAPACITY;
use crate::wal::Wal;

use super::StoreError;

/// Snapshot-read / append-write access to all entities of one kind.
#[async_trait]
pub trait Store<T>: Send + Sync {
    /// Every stored entity, in the store's enumeration order.
    async fn get_all(&self) -> Result<Vec<T>, StoreError>;

    async fn add(&self, item: &T) -> Result<(), StoreError>;
}

// ── In-memory ────────────────────────────────────────────────────

pub struct InMemoryStore<T> {
    items: RwLock<Vec<T>>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Store<T> for InMemoryStore<T> {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn add(&self, item: &T) -> Result<(), StoreError> {
        self.items.write().await.push(item.clone());
        Ok(())
    }
}

// ── WAL-backed ───────────────────────────────────────────────────

struct AppendRequest<T> {
    record: T,
    response: oneshot::Sender<io::Result<()>>,
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first append arrives.
/// 2. Drain all immediately available appends (the batch window).
/// 3. Single flush_sync for the whole batch.
/// 4. Respond to all senders with the batch result.
async fn wal_writer_loop<T: Serialize + DeserializeOwned>(
    mut wal: Wal<T>,
    mut rx: mpsc::Receiver<AppendRequest<T>>,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!("WAL flush failed for {}: {e}", wal.path().display());
        }
        for req in batch {
            let r = match &result {
                Ok(()) => Ok(()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            };
            let _ = req.response.send(r);
        }
    }
}

fn flush_batch<T: Serialize + DeserializeOwned>(
    wal: &mut Wal<T>,
    batch: &[AppendRequest<T>],
) -> io::Result<()> {
    for req in batch {
        if let Err(e) = wal.append_buffered(&req.record) {
            // The whole batch is reported failed, so none of it may land.
            wal.discard_pending();
            return Err(e);
        }
    }
    wal.flush_sync()
}

/// Durable store: snapshot served from memory, every `add` logged to a WAL
/// before it becomes visible.
pub struct WalStore<T> {
    items: RwLock<Vec<T>>,
    wal_tx: mpsc::Sender<AppendRequest<T>>,
}

impl<T> WalStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Replay `path` and start its writer task. Must be called inside a tokio runtime.
    pub fn open(path: &Path) -> io::Result<Self> {
        let (items, wal) = Wal::<T>::recover(path)?;
        info!("replayed {} records from {}", items.len(), path.display());
        let (wal_tx, wal_rx) = mpsc::channel(WAL_CHANNEL_CAPACITY);
        tokio::spawn(wal_writer_loop(wal, wal_rx));
        Ok(Self {
            items: RwLock::new(items),
            wal_tx,
        })
    }

    async fn wal_append(&self, record: &T) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(AppendRequest {
                record: record.clone(),
                response: tx,
            })
            .await
            .map_err(|_| StoreError::Closed("WAL writer shut down"))?;
        rx.await
            .map_err(|_| StoreError::Closed("WAL writer dropped response"))?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl<T> Store<T> for WalStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn add(&self, item: &T) -> Result<(), StoreError> {
        // Hold the write lock across the append so snapshot order matches log order.
        let mut items = self.items.write().await;
        self.wal_append(item).await?;
        items.push(item.clone());
        Ok(())
    }
}
