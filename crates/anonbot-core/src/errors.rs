/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the
/// relay core can handle failures consistently. Relay-specific failures that
/// end up as user-facing notices have their own types below.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Directory lookup failure (`@handle` → user id).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no user with this handle")]
    NotFound,

    #[error("the user's privacy settings hide them from lookups")]
    Private,

    #[error("lookup failed: {0}")]
    Platform(String),
}

/// Delivery failure reported by the transport.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("the recipient has blocked the bot")]
    Blocked,

    #[error("the recipient is unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Platform(String),
}

/// Why a recipient could not be determined from an identity-setting message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("the forwarded message hides its author")]
    HiddenForwardOrigin,

    #[error("not a valid user id: {0}")]
    InvalidId(String),

    #[error("not a valid handle: @{0}")]
    InvalidHandle(String),

    #[error("lookup of @{handle} failed: {source}")]
    Lookup {
        handle: String,
        #[source]
        source: LookupError,
    },
}
