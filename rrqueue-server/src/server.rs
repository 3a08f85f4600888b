use crate::{
    proto::{
        health_actix::route_health, health_server::HealthServer, queue_actix::route_queue,
        queue_server::QueueServer,
    },
    services::{HealthService, QueueService},
    settings::Settings,
};
use blockscout_service_launcher::{launcher, launcher::LaunchSettings, tracing};
use rrqueue_logic::{cleaner, QueueDescriptor, QueueEngine, RedisStore};
use tokio_util::sync::CancellationToken;

use std::sync::Arc;

const SERVICE_NAME: &str = "rrqueue";

#[derive(Clone)]
struct Router {
    health: Arc<HealthService>,
    queue: Arc<QueueService<RedisStore>>,
}

impl Router {
    pub fn grpc_router(&self) -> tonic::transport::server::Router {
        tonic::transport::Server::builder()
            .add_service(HealthServer::from_arc(self.health.clone()))
            .add_service(QueueServer::from_arc(self.queue.clone()))
    }
}

impl launcher::HttpRouter for Router {
    fn register_routes(&self, service_config: &mut actix_web::web::ServiceConfig) {
        service_config.configure(|config| {
            route_health(config, self.health.clone());
            route_queue(config, self.queue.clone());
        });
    }
}

pub async fn run(settings: Settings) -> Result<(), anyhow::Error> {
    tracing::init_logs(SERVICE_NAME, &settings.tracing, &settings.jaeger)?;

    let shutdown = CancellationToken::new();

    let store = RedisStore::connect(&settings.redis_addr).await?;
    let descriptor = QueueDescriptor::new(
        settings.queue.name.clone(),
        settings.queue.deq_period,
        settings.queue.ttl,
    );

    let engine = Arc::new(
        QueueEngine::new(store.clone(), descriptor.clone())
            .with_max_retries(settings.queue.max_retries),
    );

    let cleaner_handle = cleaner::spawn(
        Arc::new(store),
        descriptor,
        settings.queue.clean_period,
        shutdown.clone(),
    );

    let health = Arc::new(HealthService::default());
    let queue = Arc::new(QueueService::new(engine, shutdown.clone()));

    let router = Router { health, queue };

    let grpc_router = router.grpc_router();
    let http_router = router;

    let launch_settings = LaunchSettings {
        service_name: SERVICE_NAME.to_string(),
        server: settings.server,
        metrics: settings.metrics,
        graceful_shutdown: Default::default(),
    };

    let launch_result = launcher::launch(launch_settings, http_router, grpc_router).await;

    cleaner_handle.shutdown().await;

    launch_result
}
