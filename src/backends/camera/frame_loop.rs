// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for capture loops
//!
//! A capture loop owns its frame source on a dedicated thread. The
//! controller signals it to stop and joins it, so that by the time
//! [`CaptureLoopController::stop`] returns the source has been torn down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a capture loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let controller = CaptureLoopController::spawn(
///     "scanner",
///     source,
///     |source| match source.next_frame() {
///         Ok(Some(frame)) => { decode(frame); LoopAction::Continue }
///         Ok(None) => LoopAction::Continue,
///         Err(e) if e.is_fatal() => LoopAction::Stop,
///         Err(_) => LoopAction::Continue,
///     },
///     |mut source| { let _ = source.close(); },
/// );
/// ```
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Start a loop that owns `state`
    ///
    /// `teardown` receives the state exactly once after the loop exits,
    /// whether it stopped on request, by returning `LoopAction::Stop`,
    /// or because the controller was dropped.
    pub fn spawn<S, F, T>(name: &str, state: S, mut loop_fn: F, teardown: T) -> Self
    where
        S: Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
        T: FnOnce(S) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(format!("capture-{}", name))
            .spawn(move || {
                let mut state = state;
                debug!(name = %name_clone, "Capture loop thread started");

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    if loop_fn(&mut state) == LoopAction::Stop {
                        debug!(name = %name_clone, "Loop requested stop");
                        break;
                    }
                }

                teardown(state);
                info!(name = %name_clone, "Capture loop thread exiting");
            });

        let thread_handle = match thread_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to spawn capture loop thread");
                None
            }
        };

        Self {
            thread_handle,
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting
    fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread (and teardown) to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_basic_loop() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::spawn(
            "test-loop",
            (),
            move |_| {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                if count >= 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
            |_| {},
        );

        controller.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::spawn(
            "test-loop",
            (),
            move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                LoopAction::Continue
            },
            |_| {},
        );

        thread::sleep(Duration::from_millis(50));
        controller.stop();
        assert!(counter.load(Ordering::SeqCst) > 0);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_teardown_receives_state_once() {
        let torn_down = Arc::new(AtomicU32::new(0));
        let torn_down_clone = Arc::clone(&torn_down);

        let mut controller = CaptureLoopController::spawn(
            "test-teardown",
            5u32,
            |remaining| {
                *remaining -= 1;
                if *remaining == 0 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
            move |remaining| {
                assert_eq!(remaining, 0);
                torn_down_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        controller.join();
        // A second stop after the thread finished is a no-op
        controller.stop();
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops_and_tears_down() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let torn_down_clone = Arc::clone(&torn_down);

        let controller = CaptureLoopController::spawn(
            "test-drop",
            (),
            |_| {
                thread::sleep(Duration::from_millis(5));
                LoopAction::Continue
            },
            move |_| torn_down_clone.store(true, Ordering::SeqCst),
        );

        assert!(controller.is_running());
        drop(controller);
        assert!(torn_down.load(Ordering::SeqCst));
    }
}
