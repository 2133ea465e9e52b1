//! Server wiring and accept loop entry point.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::RequestHandler;
use crate::http;
use fieldsync_engine::{
    AppealWorkflow, Clock, EngineConfig, EntityStore, Notifier, SyncCoordinator,
};
use fieldsync_geo::ZoneIndex;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The reference sync server.
///
/// Wires the coordinator and appeal workflow over shared collaborators
/// and exposes them through the HTTP listener. The handler can also be
/// driven directly, which is how the tests and the loopback tools use
/// it.
pub struct SyncServer<S: EntityStore> {
    handler: Arc<RequestHandler<S>>,
}

impl<S: EntityStore + 'static> SyncServer<S> {
    /// Wires a server over the given collaborators.
    pub fn new(
        config: ServerConfig,
        engine_config: EngineConfig,
        store: Arc<S>,
        zones: Arc<dyn ZoneIndex>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let coordinator = SyncCoordinator::new(
            Arc::clone(&store),
            zones,
            Arc::clone(&clock),
            Arc::clone(&notifier),
            engine_config,
        );
        let appeals = AppealWorkflow::new(store, clock, notifier);
        Self {
            handler: Arc::new(RequestHandler::new(config, coordinator, appeals)),
        }
    }

    /// The request handler, for driving the server without sockets.
    pub fn handler(&self) -> &Arc<RequestHandler<S>> {
        &self.handler
    }

    /// Binds the configured address and serves until cancelled.
    pub async fn run(&self) -> ServerResult<()> {
        let addr = self.handler.config().bind_addr;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "sync server listening");
        http::serve(listener, Arc::clone(&self.handler)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ReviewAppealRequest, SubmitAppealRequest};
    use fieldsync_engine::{EntityStore, ManualClock, MemoryStore, NoopNotifier};
    use fieldsync_geo::MemoryZoneIndex;
    use fieldsync_model::{AppealStatus, AppealTargetKind, TaskStatus};
    use fieldsync_testkit::prelude::*;

    fn make_server() -> (SyncServer<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let zones = Arc::new(MemoryZoneIndex::from_zones(vec![unit_square_zone(1)]));
        let clock = Arc::new(ManualClock::at(test_epoch()));
        let server = SyncServer::new(
            ServerConfig::default(),
            EngineConfig::default(),
            Arc::clone(&store),
            zones,
            clock,
            Arc::new(NoopNotifier),
        );
        (server, store)
    }

    #[test]
    fn full_reject_and_appeal_flow() {
        let (server, store) = make_server();
        let handler = server.handler();

        let mut task = pending_task(7, Some(1));
        task.status = TaskStatus::InProgress;
        let task = store.insert_task(task).unwrap();

        // Completion from 600m out: synced, but auto-rejected.
        let upload = batch(vec![task_completion(
            "dev1-task-1",
            Some(task.id),
            1,
            point_south_of_square(600.0),
        )]);
        let response = handler.handle_batch(7, &upload).unwrap();
        assert_eq!(response.success_count, 1);

        let stored = store.task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Rejected);

        // Appeal and reinstate.
        let appeal = handler
            .handle_appeal_submit(
                7,
                SubmitAppealRequest {
                    kind: AppealTargetKind::Task,
                    entity_id: task.id,
                    explanation: "GPS drift".into(),
                    evidence_ref: None,
                },
            )
            .unwrap();
        assert_eq!(appeal.status, AppealStatus::Pending);

        let decided = handler
            .handle_appeal_review(
                appeal.id,
                ReviewAppealRequest {
                    approved: true,
                    notes: Some("verified".into()),
                },
            )
            .unwrap();
        assert_eq!(decided.status, AppealStatus::Approved);

        let stored = store.task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Approved);
    }
}
