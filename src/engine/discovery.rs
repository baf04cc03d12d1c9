use thiserror::Error;

use crate::config::PinConfig;
use crate::host::{HostDocument, Subscription, WatchId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("pinned panel #{id} not found after {attempts} attempts")]
    Exhausted { id: String, attempts: u32 },
}

/// Bounded polling for the pinned panel while the host is still rendering.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiscoveryPoll {
    attempts: u32,
    timer: Option<WatchId>,
    finished: bool,
}

impl DiscoveryPoll {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn owns(&self, watch: WatchId) -> bool {
        self.timer == Some(watch)
    }

    /// Records the firing of the pending retry timer and releases it.
    pub fn fired<D: HostDocument>(&mut self, doc: &D) {
        if let Some(watch) = self.timer.take() {
            doc.unsubscribe(watch);
        }
    }

    /// Counts a failed attempt and schedules the next one, or gives up once
    /// the attempt budget is spent.
    pub fn schedule_retry<D: HostDocument>(
        &mut self,
        doc: &D,
        config: &PinConfig,
    ) -> Result<WatchId, DiscoveryError> {
        self.attempts += 1;
        if self.attempts >= config.discovery.max_attempts {
            self.finished = true;
            return Err(DiscoveryError::Exhausted {
                id: config.pinned_panel_id.clone(),
                attempts: self.attempts,
            });
        }
        let watch = doc.subscribe(Subscription::Timeout {
            delay: config.discovery_delay(),
        });
        self.timer = Some(watch);
        Ok(watch)
    }

    pub fn finish<D: HostDocument>(&mut self, doc: &D) {
        if let Some(watch) = self.timer.take() {
            doc.unsubscribe(watch);
        }
        self.finished = true;
    }
}
