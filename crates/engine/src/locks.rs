//! Keyed async mutex: one event in flight per conversation.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::session::ConversationId;

/// Number of idle entries tolerated before the table is pruned.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone, Default)]
pub struct ConversationLocks {
    inner: Arc<Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>>,
}

impl ConversationLocks {
    /// Waits until no other event of `id` is being handled.
    ///
    /// The returned guard releases the conversation when dropped.
    pub async fn acquire(&self, id: ConversationId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().await;
            if table.len() > PRUNE_THRESHOLD {
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            table.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
