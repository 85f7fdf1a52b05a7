pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `requests` or `limit` is missing or zero. Raised synchronously, before
    /// any request is issued.
    #[error("benchmark run options requires requests and limit properties")]
    InvalidRunOptions,

    /// The flow has no `main` stage (or it is empty).
    #[error("benchmark flow requires an array of operations as property main")]
    MissingMain,

    /// A flow definition referenced a built-in hook name that does not exist.
    #[error("unknown hook: `{0}`")]
    UnknownHook(String),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
