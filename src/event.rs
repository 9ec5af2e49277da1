use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

use crate::exam::countdown::{IntervalHandle, IntervalId, Scheduler};
use crate::exam::evaluation::Evaluation;
use crate::exam::grader::GraderError;
use crate::exam::session::SubmissionId;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
    /// One second elapsed on the exam interval `IntervalId`.
    Countdown(IntervalId),
    /// A grading worker finished.
    Graded {
        id: SubmissionId,
        outcome: Result<Evaluation, GraderError>,
    },
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => {
                            if input_tx.send(AppEvent::Key(key)).is_err() {
                                return;
                            }
                        }
                        Ok(Event::Resize(w, h)) => {
                            if input_tx.send(AppEvent::Resize(w, h)).is_err() {
                                return;
                            }
                        }
                        _ => {}
                    }
                } else if input_tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for background producers such as the countdown and grading workers.
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

/// Runs each countdown interval on its own thread and posts
/// [`AppEvent::Countdown`] back into the event loop.
pub struct ThreadScheduler {
    tx: mpsc::Sender<AppEvent>,
}

impl ThreadScheduler {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

pub struct ThreadHandle {
    cancelled: Arc<AtomicBool>,
}

impl IntervalHandle for ThreadHandle {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Scheduler for ThreadScheduler {
    type Handle = ThreadHandle;

    fn every(&mut self, id: IntervalId, period: Duration) -> ThreadHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tx = self.tx.clone();

        thread::spawn(move || {
            loop {
                thread::sleep(period);
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                if tx.send(AppEvent::Countdown(id)).is_err() {
                    return;
                }
            }
        });

        tracing::debug!(interval = id.0, "countdown started");
        ThreadHandle { cancelled }
    }
}
