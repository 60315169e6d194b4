use tokio::sync::mpsc;

use crate::models::payments::{InboundMessage, OutboundEnvelope, OutboundMessage};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChannelError {
    #[error("message from untrusted origin {0}")]
    UntrustedOrigin(String),
    #[error("malformed frame message: {0}")]
    Malformed(String),
    #[error("payment session is no longer listening")]
    Closed,
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_lowercase()
}

/// Typed message channel to and from the hosted-fields frame.
///
/// Outbound messages are addressed to the trusted origin only. Inbound
/// messages are checked against that origin before they are decoded, so
/// nothing from another origin can reach the payment state.
pub struct FrameChannel {
    trusted_origin: String,
    inbound: mpsc::UnboundedSender<InboundMessage>,
}

impl FrameChannel {
    pub fn new(trusted_origin: &str) -> (Self, mpsc::UnboundedReceiver<InboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            trusted_origin: normalize_origin(trusted_origin),
            inbound: tx,
        };
        (channel, rx)
    }

    pub fn trusted_origin(&self) -> &str {
        &self.trusted_origin
    }

    pub fn is_trusted(&self, origin: &str) -> bool {
        normalize_origin(origin) == self.trusted_origin
    }

    /// Addresses a message to the gateway frame and nothing else.
    pub fn post(&self, message: OutboundMessage) -> OutboundEnvelope {
        OutboundEnvelope {
            target_origin: self.trusted_origin.clone(),
            message,
        }
    }

    pub fn receive(
        &self,
        origin: &str,
        data: serde_json::Value,
    ) -> Result<InboundMessage, ChannelError> {
        if !self.is_trusted(origin) {
            tracing::warn!(origin, "discarding frame message from untrusted origin");
            return Err(ChannelError::UntrustedOrigin(origin.to_string()));
        }

        let message: InboundMessage = serde_json::from_value(data)
            .map_err(|e| ChannelError::Malformed(e.to_string()))?;

        self.inbound
            .send(message.clone())
            .map_err(|_| ChannelError::Closed)?;
        Ok(message)
    }
}
