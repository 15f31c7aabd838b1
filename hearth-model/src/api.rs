use async_trait::async_trait;
use hearth_types::Snowflake;

/// Outbound request capability needed by call entities.
///
/// Implemented by the REST layer; tests substitute a recorder.
#[async_trait]
pub trait CallApi: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends `PATCH /channels/{channel_id}/call` with the given JSON body.
    async fn patch_call(
        &self,
        channel_id: Snowflake,
        body: serde_json::Value,
    ) -> Result<(), Self::Error>;
}
