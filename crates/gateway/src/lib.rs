use std::sync::Arc;

mod error;
mod gateway;
mod http;
mod wire;

pub use error::{FailureKind, GatewayError, GatewayResult};
pub use gateway::{
    BackendGateway, BoxFuture, DEFAULT_BASE_URL, GatewayConfig, Operation, ProgressCallback,
    TransferProgress, UploadPayload, mime_type_for,
};
pub use http::HttpGateway;
pub use wire::{
    ChatReply, ChatRequest, FrameDescriptor, ProcessedVideo, TranscriptSegment, UploadReceipt,
};

pub fn create_gateway(config: GatewayConfig) -> GatewayResult<Arc<dyn BackendGateway>> {
    tracing::debug!(base_url = %config.base_url, "creating http backend gateway");
    Ok(Arc::new(HttpGateway::new(config)?))
}
