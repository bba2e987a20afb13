//! Shared runtime context handed to worker loops.

use std::sync::Arc;

use vp_av::ToolRegistry;
use vp_core::config::Config;
use vp_db::pool::DbPool;

use crate::notify::NotificationManager;

/// Everything a worker loop needs: pool, config, discovered tools, and the
/// delivery client.  Cheap to clone; one clone per worker instance.
#[derive(Clone)]
pub struct WorkerContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub tools: ToolRegistry,
    pub notifier: Arc<NotificationManager>,
}

impl WorkerContext {
    pub fn new(db: DbPool, config: Arc<Config>, tools: ToolRegistry) -> Self {
        let notifier = Arc::new(NotificationManager::new(&config.delivery));
        Self {
            db,
            config,
            tools,
            notifier,
        }
    }
}
