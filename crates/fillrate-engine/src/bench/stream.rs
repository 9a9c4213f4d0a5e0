use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Duration;

use super::{Metrics, MetricsObserver};

/// Default number of samples buffered for a slow consumer.
pub const DEFAULT_STREAM_CAPACITY: usize = 256;

/// Creates a bounded metrics channel.
///
/// The sending half never blocks the frame loop: when the buffer is full the
/// newest sample is dropped and counted.
pub fn metrics_channel(capacity: usize) -> (ChannelObserver, MetricsStream) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (
        ChannelObserver {
            tx,
            dropped: DroppedSamples::default(),
            disconnected: false,
        },
        MetricsStream { rx },
    )
}

/// Frame-loop side of a metrics channel.
pub struct ChannelObserver {
    tx: SyncSender<Metrics>,
    dropped: DroppedSamples,
    disconnected: bool,
}

impl ChannelObserver {
    /// Samples discarded because the consumer fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped.get()
    }

    /// Shared view of the drop count, readable after the observer is boxed.
    pub fn dropped_counter(&self) -> DroppedSamples {
        self.dropped.clone()
    }
}

/// Count of metrics samples a full stream discarded.
#[derive(Debug, Clone, Default)]
pub struct DroppedSamples {
    count: Arc<AtomicU64>,
}

impl DroppedSamples {
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn bump(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

impl MetricsObserver for ChannelObserver {
    fn publish(&mut self, metrics: &Metrics) {
        if self.disconnected {
            return;
        }
        match self.tx.try_send(*metrics) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.bump();
                log::trace!("metrics stream full; dropped frame {}", metrics.frame_index);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("metrics stream consumer went away");
                self.disconnected = true;
            }
        }
    }
}

/// Consumer side of the metrics channel.
///
/// Iteration ends once the benchmark shuts down and drops its sender.
pub struct MetricsStream {
    rx: Receiver<Metrics>,
}

impl MetricsStream {
    /// Next sample if one is buffered.
    pub fn try_next(&self) -> Option<Metrics> {
        self.rx.try_recv().ok()
    }

    /// Blocks for the next sample; `None` once the benchmark has shut down.
    pub fn next_blocking(&self) -> Option<Metrics> {
        self.rx.recv().ok()
    }

    /// Blocks for at most `timeout`.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Metrics, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Drains everything currently buffered.
    pub fn drain(&self) -> Vec<Metrics> {
        self.rx.try_iter().collect()
    }
}

impl IntoIterator for MetricsStream {
    type Item = Metrics;
    type IntoIter = mpsc::IntoIter<Metrics>;

    fn into_iter(self) -> Self::IntoIter {
        self.rx.into_iter()
    }
}

/// Cloneable request to stop a running benchmark from any thread.
///
/// The frame loop observes the flag on its next tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: u64) -> Metrics {
        Metrics::compute(i as f64, 1024).with_frame_index(i)
    }

    #[test]
    fn samples_arrive_in_order() {
        let (mut tx, rx) = metrics_channel(8);
        for i in 0..3 {
            tx.publish(&sample(i));
        }
        let got: Vec<u64> = rx.drain().iter().map(|m| m.frame_index).collect();
        assert_eq!(got, [0, 1, 2]);
        assert!(rx.try_next().is_none());
    }

    #[test]
    fn full_buffer_drops_newest_without_blocking() {
        let (mut tx, rx) = metrics_channel(2);
        for i in 0..5 {
            tx.publish(&sample(i));
        }
        assert_eq!(tx.dropped(), 3);
        assert_eq!(tx.dropped_counter().get(), 3);
        let got: Vec<u64> = rx.drain().iter().map(|m| m.frame_index).collect();
        assert_eq!(got, [0, 1]);
    }

    #[test]
    fn drop_counter_outlives_the_observer() {
        let (mut tx, rx) = metrics_channel(1);
        let counter = tx.dropped_counter();
        tx.publish(&sample(0));
        tx.publish(&sample(1));
        drop(tx);

        assert_eq!(counter.get(), 1);
        assert_eq!(rx.drain().len(), 1);
    }

    #[test]
    fn stream_ends_when_sender_dropped() {
        let (mut tx, rx) = metrics_channel(4);
        tx.publish(&sample(9));
        drop(tx);
        let all: Vec<Metrics> = rx.into_iter().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].frame_index, 9);
    }

    #[test]
    fn publishing_after_consumer_left_is_silent() {
        let (mut tx, rx) = metrics_channel(4);
        drop(rx);
        tx.publish(&sample(1));
        tx.publish(&sample(2));
        assert_eq!(tx.dropped(), 0);
    }

    #[test]
    fn timeout_when_nothing_published() {
        let (_tx, rx) = metrics_channel(1);
        assert!(matches!(
            rx.next_timeout(Duration::from_millis(1)),
            Err(RecvTimeoutError::Timeout)
        ));
    }

    #[test]
    fn stop_handle_is_shared_between_clones() {
        let a = StopHandle::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }

    #[test]
    fn stop_handle_crosses_threads() {
        let h = StopHandle::new();
        let remote = h.clone();
        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(h.is_stopped());
    }
}
