use async_trait::async_trait;
use serde_json::Value;

/// Outbound message transport. The pipeline only ever talks to this trait,
/// so tests can swap in a recording fake and other gateways can slot in
/// without touching dispatch logic.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `text` to `recipient`. `options` carries platform extras
    /// (delay, quoting, link preview) passed through verbatim.
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        options: Option<&Value>,
    ) -> anyhow::Result<()>;
}
