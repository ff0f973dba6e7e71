use snafu::Snafu;

use super::gateway::Operation;

/// Coarse failure class, independent of the transport library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request could not be assembled locally; nothing was sent.
    Request,
    Transport,
    Server,
    Protocol,
    Parse,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GatewayError {
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to encode {operation} request on `{stage}`: {source}"))]
    EncodeRequest {
        stage: &'static str,
        operation: Operation,
        source: reqwest::Error,
    },
    #[snafu(display("{operation} request failed on `{stage}`: {source}"))]
    Transport {
        stage: &'static str,
        operation: Operation,
        source: reqwest::Error,
    },
    #[snafu(display("{operation} endpoint returned status {status}: {body}"))]
    Server {
        stage: &'static str,
        operation: Operation,
        status: u16,
        body: String,
    },
    #[snafu(display("{operation} response violated the protocol: {details}"))]
    Protocol {
        stage: &'static str,
        operation: Operation,
        details: String,
    },
    #[snafu(display("{operation} response is not valid JSON on `{stage}`: {source}"))]
    Parse {
        stage: &'static str,
        operation: Operation,
        body: String,
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::BuildClient { .. } | Self::EncodeRequest { .. } => FailureKind::Request,
            Self::Transport { .. } => FailureKind::Transport,
            Self::Server { .. } => FailureKind::Server,
            Self::Protocol { .. } => FailureKind::Protocol,
            Self::Parse { .. } => FailureKind::Parse,
        }
    }

    /// Operation that failed, when the failure happened on a request.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::BuildClient { .. } => None,
            Self::EncodeRequest { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Server { operation, .. }
            | Self::Protocol { operation, .. }
            | Self::Parse { operation, .. } => Some(*operation),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
