#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use focus_poll::{infra::activity::ManualActivitySource, FetchPort, Poller, PollerOptions};

#[derive(Clone, Default)]
pub struct FakeFetch {
    calls: Arc<AtomicUsize>,
    delay_ms: Arc<Mutex<u64>>,
    failing: Arc<Mutex<bool>>,
    panic_on_call: Arc<Mutex<Option<usize>>>,
}

impl FakeFetch {
    pub fn set_delay_ms(&self, delay_ms: u64) {
        *self.delay_ms.lock().unwrap() = delay_ms;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn panic_on_call(&self, call: usize) {
        *self.panic_on_call.lock().unwrap() = Some(call);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchPort<String> for FakeFetch {
    async fn fetch(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay_ms = *self.delay_ms.lock().unwrap();
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let panic_on_call = *self.panic_on_call.lock().unwrap();
        if panic_on_call == Some(n) {
            panic!("fetch call {n} blew up");
        }

        let failing = *self.failing.lock().unwrap();
        if failing {
            return Err(anyhow!("backend down"));
        }
        Ok(format!("v{n}"))
    }
}

pub fn build_poller(
    fetch: &FakeFetch,
    source: &Arc<ManualActivitySource>,
    options: PollerOptions,
) -> Poller<String> {
    let port: Arc<dyn FetchPort<String>> = Arc::new(fetch.clone());
    Poller::builder(port)
        .options(options)
        .activity_source(source.clone())
        .build()
        .unwrap()
}
