//! Single-slot mailbox.
//!
//! ```text
//!            put()                        get()
//!  producers ─────► [empty] ──► [full] ─────► consumer
//!                      ▲                        │
//!                      └────────────────────────┘
//! ```
//!
//! Two semaphores track whether the slot is empty or full. A producer-side
//! mutex and a consumer-side mutex serialize each side independently, so
//! concurrent producers queue up behind one another and can never
//! clobber the slot, and items come out in the order they went in.

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use super::Closed;

pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    empty: Semaphore,
    full: Semaphore,
    put_lock: AsyncMutex<()>,
    get_lock: AsyncMutex<()>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            empty: Semaphore::new(1),
            full: Semaphore::new(0),
            put_lock: AsyncMutex::new(()),
            get_lock: AsyncMutex::new(()),
        }
    }

    /// Store `item`, waiting until any previous item has been taken.
    pub async fn put(&self, item: T) -> Result<(), Closed<T>> {
        let _producer = self.put_lock.lock().await;

        match self.empty.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(Closed(item)),
        }

        *self.slot.lock() = Some(item);
        self.full.add_permits(1);
        Ok(())
    }

    /// Take the pending item, waiting until one is stored.
    pub async fn get(&self) -> Result<T, Closed<()>> {
        let _consumer = self.get_lock.lock().await;

        self.full.acquire().await.map_err(|_| Closed(()))?.forget();

        let item = self.slot.lock().take();
        self.empty.add_permits(1);

        match item {
            Some(item) => Ok(item),
            None => unreachable!("full permit granted for an empty slot"),
        }
    }

    /// True while an item is waiting to be taken.
    pub fn is_full(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Wake every waiter with [`Closed`]. A pending item is discarded
    /// along with the mailbox.
    pub fn close(&self) {
        self.empty.close();
        self.full.close();
    }

    pub fn is_closed(&self) -> bool {
        self.full.is_closed()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
