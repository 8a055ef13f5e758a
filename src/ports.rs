use std::{future::Future, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The wrapped data-fetch operation. Invoked with no arguments, may fail.
#[async_trait]
pub trait FetchPort<T>: Send + Sync {
    async fn fetch(&self) -> Result<T>;
}

/// Closure-backed [`FetchPort`]. Each call produces a fresh future.
#[derive(Debug, Clone)]
pub struct FetchFn<F> {
    f: F,
}

impl<F> FetchFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> FetchPort<T> for FetchFn<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    async fn fetch(&self) -> Result<T> {
        (self.f)().await
    }
}

pub type ActivityHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Source of "went inactive" / "became active" notifications.
pub trait ActivitySourcePort: Send + Sync {
    fn subscribe_active(&self, handler: ActivityHandler) -> Result<SubscriptionId>;
    fn subscribe_inactive(&self, handler: ActivityHandler) -> Result<SubscriptionId>;
    fn unsubscribe(&self, id: SubscriptionId);
}

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
