use std::time::Duration;

/// A refresh execution that did not produce a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RefreshFault {
    /// The refresher returned an error or panicked.
    #[error("refresher failed: {0}")]
    Failed(#[source] anyhow::Error),
    /// The execution overran its deadline and was disowned.
    #[error("refresher timed out after {0:?}")]
    TimedOut(Duration),
}

impl RefreshFault {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RefreshFault::TimedOut(_))
    }

    /// The refresher's own error, if any.
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            RefreshFault::Failed(e) => Some(e),
            RefreshFault::TimedOut(_) => None,
        }
    }
}
