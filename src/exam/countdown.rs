use std::time::Duration;

/// Identifies one started interval so late ticks from a cancelled one can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntervalId(pub u64);

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a repeating callback. Cancelling is idempotent.
pub trait IntervalHandle {
    fn cancel(&mut self);
}

/// Starts repeating intervals that report back tagged with their [`IntervalId`].
pub trait Scheduler {
    type Handle: IntervalHandle;

    fn every(&mut self, id: IntervalId, period: Duration) -> Self::Handle;
}

/// The one-second countdown driver owned by an exam session.
pub struct Countdown<S: Scheduler> {
    scheduler: S,
    active: Option<(IntervalId, S::Handle)>,
    next_id: u64,
}

impl<S: Scheduler> Countdown<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            active: None,
            next_id: 0,
        }
    }

    /// Start a fresh interval, cancelling any running one first.
    pub fn start(&mut self) -> IntervalId {
        self.stop();
        self.next_id += 1;
        let id = IntervalId(self.next_id);
        let handle = self.scheduler.every(id, TICK_PERIOD);
        self.active = Some((id, handle));
        id
    }

    pub fn stop(&mut self) {
        if let Some((_, mut handle)) = self.active.take() {
            handle.cancel();
        }
    }

    pub fn is_current(&self, id: IntervalId) -> bool {
        self.active.as_ref().is_some_and(|(active, _)| *active == id)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}

impl<S: Scheduler> Drop for Countdown<S> {
    fn drop(&mut self) {
        self.stop();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualScheduler;
    use super::*;

    #[test]
    fn start_replaces_running_interval() {
        let sched = ManualScheduler::default();
        let log = sched.log.clone();
        let mut countdown = Countdown::new(sched);

        let first = countdown.start();
        let second = countdown.start();
        assert_ne!(first, second);
        assert!(!countdown.is_current(first));
        assert!(countdown.is_current(second));
        assert_eq!(log.borrow().cancelled, vec![first]);
        assert_eq!(log.borrow().running(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let sched = ManualScheduler::default();
        let log = sched.log.clone();
        let mut countdown = Countdown::new(sched);
        countdown.start();
        countdown.stop();
        countdown.stop();
        assert!(!countdown.is_running());
        assert_eq!(log.borrow().cancelled.len(), 1);
    }

    #[test]
    fn drop_cancels_interval() {
        let sched = ManualScheduler::default();
        let log = sched.log.clone();
        {
            let mut countdown = Countdown::new(sched);
            countdown.start();
        }
        assert_eq!(log.borrow().running(), 0);
    }
}
