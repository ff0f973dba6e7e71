use bytes::Bytes;
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use snafu::{OptionExt, ResultExt};

use super::error::{
    BuildClientSnafu, EncodeRequestSnafu, GatewayResult, ParseSnafu, ProtocolSnafu, ServerSnafu,
    TransportSnafu,
};
use super::gateway::{
    BackendGateway, BoxFuture, GatewayConfig, Operation, ProgressCallback, TransferProgress,
    UploadPayload, mime_type_for,
};
use super::wire::{
    ChatReply, ChatRequest, FilenameBody, ProcessBody, ProcessedVideo, SummaryBody, UploadBody,
    UploadReceipt,
};

const UPLOAD_FIELD_NAME: &str = "file";
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;
const ERROR_BODY_SNIPPET_CHARS: usize = 512;

/// [`BackendGateway`] over HTTP/JSON.
///
/// No timeout is configured: a hung backend keeps the caller suspended until the
/// connection is dropped.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder().build().context(BuildClientSnafu {
            stage: "http-gateway-new",
        })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post_json<B, T>(&self, operation: Operation, body: &B) -> GatewayResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.config.endpoint(operation))
            .json(body)
            .send()
            .await
            .context(TransportSnafu {
                stage: "send-json-request",
                operation,
            })?;

        read_json(operation, response).await
    }
}

async fn read_json<T: DeserializeOwned>(operation: Operation, response: Response) -> GatewayResult<T> {
    let status = response.status();
    if !status.is_success() {
        // Error bodies are diagnostic only; an unreadable one must not mask the status.
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            operation = %operation,
            status = status.as_u16(),
            "backend returned a failure status"
        );
        return ServerSnafu {
            stage: "check-response-status",
            operation,
            status: status.as_u16(),
            body: snippet(&body),
        }
        .fail();
    }

    let body = response.text().await.context(TransportSnafu {
        stage: "read-response-body",
        operation,
    })?;

    serde_json::from_str(&body).context(ParseSnafu {
        stage: "decode-response-json",
        operation,
        body: snippet(&body),
    })
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_BODY_SNIPPET_CHARS).collect()
}

/// Streams `bytes` in fixed chunks, reporting cumulative progress as each chunk is taken.
fn progress_body(bytes: Vec<u8>, on_progress: ProgressCallback) -> Body {
    let bytes = Bytes::from(bytes);
    let total = bytes.len();
    let chunks = (0..total).step_by(UPLOAD_CHUNK_BYTES).map(move |start| {
        let end = (start + UPLOAD_CHUNK_BYTES).min(total);
        on_progress(TransferProgress {
            sent_bytes: end as u64,
            total_bytes: total as u64,
        });
        Ok::<_, std::io::Error>(bytes.slice(start..end))
    });

    Body::wrap_stream(stream::iter(chunks))
}

/// Content type for the upload part.
///
/// The reported type is used when it is a well-formed `type/subtype`; anything else
/// (empty, missing slash, stray characters) falls back to the type implied by the file
/// extension.
fn upload_content_type<'a>(file_name: &str, reported: &'a str) -> &'a str {
    let essence = reported.split(';').next().unwrap_or_default().trim();
    let is_token = |part: &str| {
        !part.is_empty()
            && part.chars().all(|character| {
                character.is_ascii_alphanumeric() || "!#$&-^_.+".contains(character)
            })
    };
    match essence.split_once('/') {
        Some((kind, subtype)) if is_token(kind) && is_token(subtype) => essence,
        _ => mime_type_for(file_name),
    }
}

impl BackendGateway for HttpGateway {
    fn upload<'a>(
        &'a self,
        payload: UploadPayload,
        on_progress: ProgressCallback,
    ) -> BoxFuture<'a, GatewayResult<UploadReceipt>> {
        Box::pin(async move {
            let operation = Operation::Upload;
            let UploadPayload {
                file_name,
                mime_type,
                bytes,
            } = payload;
            let total_bytes = bytes.len() as u64;

            tracing::debug!(
                file_name = %file_name,
                mime_type = %mime_type,
                total_bytes,
                "sending upload request"
            );

            let content_type = upload_content_type(&file_name, &mime_type);
            if content_type != mime_type {
                tracing::debug!(
                    reported = %mime_type,
                    content_type,
                    "normalized reported MIME type for upload"
                );
            }
            let part = Part::stream_with_length(progress_body(bytes, on_progress), total_bytes)
                .file_name(file_name)
                .mime_str(content_type)
                .context(EncodeRequestSnafu {
                    stage: "build-upload-part",
                    operation,
                })?;
            let form = Form::new().part(UPLOAD_FIELD_NAME, part);

            let response = self
                .client
                .post(self.config.endpoint(operation))
                .multipart(form)
                .send()
                .await
                .context(TransportSnafu {
                    stage: "send-upload-request",
                    operation,
                })?;

            let body: UploadBody = read_json(operation, response).await?;
            let server_filename = body
                .filename
                .filter(|filename| !filename.trim().is_empty())
                .context(ProtocolSnafu {
                    stage: "upload-response-filename",
                    operation,
                    details: "response carries no `filename`",
                })?;

            Ok(UploadReceipt { server_filename })
        })
    }

    fn process<'a>(&'a self, server_filename: &'a str) -> BoxFuture<'a, GatewayResult<ProcessedVideo>> {
        Box::pin(async move {
            let operation = Operation::Process;
            let body: ProcessBody = self
                .post_json(
                    operation,
                    &FilenameBody {
                        filename: server_filename,
                    },
                )
                .await?;

            let transcript_text = body.transcript_text.context(ProtocolSnafu {
                stage: "process-response-transcript",
                operation,
                details: "response carries no `transcript_text`",
            })?;

            Ok(ProcessedVideo {
                transcript_text,
                transcript_segments: body.transcript_segments,
                frames: body.frames,
                summary: body.summary.filter(|summary| !summary.trim().is_empty()),
            })
        })
    }

    fn summarize<'a>(&'a self, server_filename: &'a str) -> BoxFuture<'a, GatewayResult<String>> {
        Box::pin(async move {
            let operation = Operation::Summary;
            let body: SummaryBody = self
                .post_json(
                    operation,
                    &FilenameBody {
                        filename: server_filename,
                    },
                )
                .await?;

            body.summary.context(ProtocolSnafu {
                stage: "summary-response-summary",
                operation,
                details: "response carries no `summary`",
            })
        })
    }

    fn chat<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, GatewayResult<ChatReply>> {
        Box::pin(async move { self.post_json(Operation::Chat, &request).await })
    }
}
