//! Script engine contract consumed by the execution pipeline.
//!
//! The engine compiles component sources and produces execution objects;
//! the pipeline never looks inside either. Completion of asynchronous work
//! inside an execution object is signalled through [`Activity`].

use std::sync::Arc;

use tokio::sync::watch;
use url::Url;

use crate::component::projection::{Inbound, Outbound};
use crate::component::Component;

/// Compiles component sources.
pub trait ScriptEngine: Send + Sync {
    /// Start compiling the source at `url`.
    ///
    /// The returned component may still be `Loading`; the engine settles it
    /// later through its [`ComponentLoader`](crate::component::ComponentLoader).
    fn compile(&self, url: &Url) -> Arc<Component>;

    /// Drop any engine-internal caches. Called on execution object teardown
    /// when component caching is disabled.
    fn trim_cache(&self) {}
}

/// Executable state of a ready component, shared by all its instances.
pub trait Program: Send + Sync {
    /// Create a fresh execution object for one request.
    fn instantiate(&self) -> Result<Box<dyn ExecutionObject>, String>;
}

/// One per-request instance of a component.
pub trait ExecutionObject: Send + 'static {
    /// Begin executing with the request projection.
    ///
    /// Objects that keep working after returning call [`Activity::begin`]
    /// before returning and [`Activity::finish`] (from any task) when done.
    fn ready(&mut self, inbound: &Inbound, activity: &Activity);

    /// Take the response projection. Called exactly once, after the object
    /// reported it is no longer working.
    fn drain(&mut self) -> Outbound;
}

/// Level-triggered "still working" flag of an execution object.
#[derive(Debug, Clone)]
pub struct Activity {
    working: Arc<watch::Sender<bool>>,
}

/// Pipeline side of an [`Activity`].
#[derive(Debug)]
pub struct ActivityWatch {
    rx: watch::Receiver<bool>,
}

/// Every [`Activity`] handle was dropped while the object was still working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("execution object dropped its activity while working")]
pub struct ActivityDropped;

impl Activity {
    /// A fresh idle flag and its watcher.
    pub fn new() -> (Activity, ActivityWatch) {
        let (tx, rx) = watch::channel(false);
        (Activity { working: Arc::new(tx) }, ActivityWatch { rx })
    }

    pub fn begin(&self) {
        self.working.send_replace(true);
    }

    pub fn finish(&self) {
        self.working.send_replace(false);
    }

    pub fn is_working(&self) -> bool {
        *self.working.borrow()
    }
}

impl ActivityWatch {
    /// Resolve once the flag is (or becomes) false.
    pub async fn finished(mut self) -> Result<(), ActivityDropped> {
        self.rx
            .wait_for(|working| !*working)
            .await
            .map(|_| ())
            .map_err(|_| ActivityDropped)
    }
}
