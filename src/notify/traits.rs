use async_trait::async_trait;

/// Chat adapter contract. New chat destinations only need to implement this trait.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Stable channel identifier (e.g. `telegram`).
    fn id(&self) -> &'static str;

    /// Deliver `text` to the configured destination.
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// One outbound plaintext email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email transport contract.
///
/// Each call is one independent delivery attempt; implementations must not
/// keep a session open between calls.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()>;
}
