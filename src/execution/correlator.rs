//! Pending transaction table.
//!
//! Every suspended request is parked here under a [`TxHandle`] until the
//! component it waits on settles. Whoever takes the record first (the
//! completion, the destruction or the timeout path) finishes the request;
//! later takers get `None` and do nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use crate::component::{Component, ExecutionObject};
use crate::handlers::Exchange;
use crate::observability::metrics;

/// Opaque key of a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(u64);

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// What a suspended request is waiting on.
pub enum Transaction {
    /// The component is still `Loading`.
    Compiling {
        component: Arc<Component>,
        exchange: Exchange,
    },
    /// The execution object reported it is still working.
    Executing {
        url: Url,
        object: Box<dyn ExecutionObject>,
        exchange: Exchange,
    },
}

impl Transaction {
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Compiling { .. } => "compiling",
            Transaction::Executing { .. } => "executing",
        }
    }

    pub fn into_exchange(self) -> Exchange {
        match self {
            Transaction::Compiling { exchange, .. } | Transaction::Executing { exchange, .. } => exchange,
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Compiling { component, .. } => f
                .debug_struct("Compiling")
                .field("url", &component.url().as_str())
                .finish_non_exhaustive(),
            Transaction::Executing { url, .. } => f
                .debug_struct("Executing")
                .field("url", &url.as_str())
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Default)]
pub struct Correlator {
    next: AtomicU64,
    pending: Mutex<HashMap<TxHandle, Transaction>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, transaction: Transaction) -> TxHandle {
        let handle = TxHandle(self.next.fetch_add(1, Ordering::Relaxed));
        tracing::trace!(tx = %handle, kind = transaction.kind(), "Transaction suspended");
        let mut pending = self.lock();
        pending.insert(handle, transaction);
        metrics::set_pending(pending.len());
        handle
    }

    /// Remove the record for `handle`. `None` means it was already handled.
    pub fn take(&self, handle: TxHandle) -> Option<Transaction> {
        let mut pending = self.lock();
        let taken = pending.remove(&handle);
        metrics::set_pending(pending.len());
        if taken.is_none() {
            tracing::trace!(tx = %handle, "Transaction already handled");
        }
        taken
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TxHandle, Transaction>> {
        // The map stays consistent across a panicking holder.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
