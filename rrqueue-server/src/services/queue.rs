use std::sync::Arc;

use rrqueue_logic::{EngineError, QueueEngine, QueueStore};
use tokio_util::sync::CancellationToken;

use crate::proto::{
    dequeue_response, queue_server::Queue, CountRequest, CountResponse, DequeueRequest,
    DequeueResponse, EnqueueRequest, EnqueueResponse, ExistsRequest, ExistsResponse, Null,
    QueuedItem, RemoveRequest, RemoveResponse,
};

pub struct QueueService<S: QueueStore> {
    engine: Arc<QueueEngine<S>>,
    shutdown: CancellationToken,
}

impl<S: QueueStore> QueueService<S> {
    pub fn new(engine: Arc<QueueEngine<S>>, shutdown: CancellationToken) -> Self {
        Self { engine, shutdown }
    }
}

#[async_trait::async_trait]
impl<S> Queue for QueueService<S>
where
    S: QueueStore,
{
    async fn enqueue(
        &self,
        request: tonic::Request<EnqueueRequest>,
    ) -> Result<tonic::Response<EnqueueResponse>, tonic::Status> {
        let request = request.into_inner();
        if request.id.is_empty() {
            return Err(tonic::Status::invalid_argument("id must not be empty"));
        }
        self.engine
            .enqueue(&request.id, request.data)
            .await
            .map_err(Into::into)?;
        Ok(tonic::Response::new(EnqueueResponse {}))
    }

    async fn dequeue(
        &self,
        _request: tonic::Request<DequeueRequest>,
    ) -> Result<tonic::Response<DequeueResponse>, tonic::Status> {
        let item = self
            .engine
            .dequeue(&self.shutdown)
            .await
            .map_err(Into::into)?;

        let maybe_item = match item {
            Some(item) => dequeue_response::MaybeItem::Data(QueuedItem {
                id: item.id,
                data: item.data,
            }),
            None => dequeue_response::MaybeItem::Null(Null {}),
        };

        Ok(tonic::Response::new(DequeueResponse {
            maybe_item: Some(maybe_item),
        }))
    }

    async fn remove(
        &self,
        request: tonic::Request<RemoveRequest>,
    ) -> Result<tonic::Response<RemoveResponse>, tonic::Status> {
        let request = request.into_inner();
        if request.id.is_empty() {
            return Err(tonic::Status::invalid_argument("id must not be empty"));
        }
        self.engine
            .remove(&request.id)
            .await
            .map_err(Into::into)?;
        Ok(tonic::Response::new(RemoveResponse {}))
    }

    async fn exists(
        &self,
        request: tonic::Request<ExistsRequest>,
    ) -> Result<tonic::Response<ExistsResponse>, tonic::Status> {
        let request = request.into_inner();
        if request.id.is_empty() {
            return Err(tonic::Status::invalid_argument("id must not be empty"));
        }
        let exists = self
            .engine
            .exists(&request.id)
            .await
            .map_err(Into::into)?;
        Ok(tonic::Response::new(ExistsResponse { exists }))
    }

    async fn count(
        &self,
        _request: tonic::Request<CountRequest>,
    ) -> Result<tonic::Response<CountResponse>, tonic::Status> {
        let count = self.engine.count().await.map_err(Into::into)?;
        Ok(tonic::Response::new(CountResponse { count }))
    }
}
