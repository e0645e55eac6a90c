//! Terminal input thread and application event channel.
//!
//! [`EventHandler`] reads crossterm events on an OS thread because `event::poll()` blocks
//! and would starve the async runtime. The log poller shares the same channel through
//! [`EventHandler::sender`].

use crate::stream::StreamUpdate;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize,
    LogUpdate(StreamUpdate),
    /// Global toast, auto-dismisses after `ERROR_TTL_SECS`.
    Error(String),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let thread = std::thread::spawn(move || {
            while !shutdown_flag.load(Ordering::Relaxed) {
                match event::poll(tick_rate) {
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(format!("Terminal poll error: {e}")));
                        break;
                    }
                    Ok(false) => {
                        if event_tx.send(AppEvent::Tick).is_err() {
                            break;
                        }
                        continue;
                    }
                    Ok(true) => {}
                }
                let sent = match event::read() {
                    Ok(CrosstermEvent::Key(key)) => event_tx.send(AppEvent::Key(key)),
                    Ok(CrosstermEvent::Resize(..)) => event_tx.send(AppEvent::Resize),
                    Ok(_) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(()),
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(format!("Terminal read error: {e}")));
                        break;
                    }
                };
                if sent.is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            tx,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("event thread panicked");
            }
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        // Only signal; joining here can deadlock while `poll` blocks during unwinding.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
