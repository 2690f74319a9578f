//! Names of the rooms other records point at, fetched once per id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

use crate::api::Remote;
use crate::error::ApiResult;
use crate::model::Room;

pub struct RoomNames {
    remote: Arc<dyn Remote<Room>>,
    runtime: Handle,
    /// `None` while the lookup is in flight.
    names: HashMap<i64, Option<String>>,
    tx: UnboundedSender<(i64, ApiResult<Room>)>,
    rx: UnboundedReceiver<(i64, ApiResult<Room>)>,
}

impl RoomNames {
    pub fn new(remote: Arc<dyn Remote<Room>>, runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            remote,
            runtime,
            names: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Start a lookup for every id not known or pending yet.
    pub fn request(&mut self, ids: impl IntoIterator<Item = i64>) {
        for id in ids {
            if self.names.contains_key(&id) {
                continue;
            }
            self.names.insert(id, None);
            let remote = Arc::clone(&self.remote);
            let tx = self.tx.clone();
            self.runtime.spawn(async move {
                let result = remote.fetch_one(id).await;
                let _ = tx.send((id, result));
            });
        }
    }

    /// Apply finished lookups. A failed one is forgotten so the next page load retries it.
    pub fn tick(&mut self) {
        while let Ok((id, result)) = self.rx.try_recv() {
            match result {
                Ok(room) => {
                    self.names.insert(id, Some(room.name));
                }
                Err(e) => {
                    debug!(room = id, error = %e, "room lookup failed");
                    self.names.remove(&id);
                }
            }
        }
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.names.get(&id).and_then(|n| n.as_deref())
    }

    pub fn is_pending(&self, id: i64) -> bool {
        matches!(self.names.get(&id), Some(None))
    }
}
