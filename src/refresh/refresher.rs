//! Producers of cache snapshots.

use anyhow::anyhow;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use super::panic_message;

/// Zero-argument producer of the next snapshot.
///
/// Any `Fn() -> impl Future<Output = anyhow::Result<V>>` closure is a refresher.
/// Synchronous producers go through [`BlockingRefresher`].
#[async_trait]
pub trait Refresher<V>: Send + Sync + 'static {
    async fn refresh(&self) -> anyhow::Result<V>;
}

#[async_trait]
impl<V, F, Fut> Refresher<V> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    V: Send + 'static,
{
    async fn refresh(&self) -> anyhow::Result<V> {
        (self)().await
    }
}

/// Runs a blocking producer on the tokio blocking pool.
pub struct BlockingRefresher<F>(Arc<F>);

impl<F> BlockingRefresher<F> {
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[async_trait]
impl<V, F> Refresher<V> for BlockingRefresher<F>
where
    F: Fn() -> anyhow::Result<V> + Send + Sync + 'static,
    V: Send + 'static,
{
    async fn refresh(&self) -> anyhow::Result<V> {
        let f = Arc::clone(&self.0);
        match tokio::task::spawn_blocking(move || f()).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(anyhow!(
                "blocking refresher panicked: {}",
                panic_message(e.into_panic().as_ref())
            )),
            Err(e) => Err(anyhow!("blocking refresher was cancelled: {e}")),
        }
    }
}
