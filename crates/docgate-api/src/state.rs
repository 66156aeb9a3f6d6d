//! Shared application state wired through the router.

use docgate_config::AppConfig;
use docgate_scratch::ScratchStore;
use docgate_telemetry::Metrics;
use docgate_transform::Dispatcher;

/// Dependencies shared by every handler.
pub struct ApiState {
    /// Full configuration snapshot.
    pub config: AppConfig,
    /// Metrics registry handle.
    pub metrics: Metrics,
    /// Injected scratch-storage root.
    pub store: ScratchStore,
    /// Operation router.
    pub dispatcher: Dispatcher,
}

impl ApiState {
    /// Bundle the shared dependencies.
    #[must_use]
    pub const fn new(
        config: AppConfig,
        metrics: Metrics,
        store: ScratchStore,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            metrics,
            store,
            dispatcher,
        }
    }
}
