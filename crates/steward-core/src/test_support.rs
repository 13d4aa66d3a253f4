//! Shared test doubles

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::agent::AgentCore;
use crate::error::StewardResult;

/// Write target a test can inspect after handing it to a printer.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Agent core that records the calls the controller makes.
#[derive(Debug, Default)]
pub(crate) struct MockAgent {
    started: Mutex<Vec<String>>,
    cancels: AtomicUsize,
}

impl MockAgent {
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentCore for MockAgent {
    async fn start_new_task(&self, text: &str) -> StewardResult<()> {
        self.started.lock().push(text.to_string());
        Ok(())
    }

    async fn set_custom_instructions(&self, _text: &str) -> StewardResult<()> {
        Ok(())
    }

    async fn cancel_task(&self) -> StewardResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
