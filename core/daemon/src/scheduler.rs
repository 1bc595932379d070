//! Periodic re-evaluation.
//!
//! One dedicated thread owns the cadence: sleep, then run a tick to
//! completion before sleeping again. Ticks can therefore never overlap; a
//! slow evaluation defers the next tick instead of racing it.

use crate::state::SharedState;
use presence_core::StatusPublisher;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub fn spawn<P>(state: Arc<SharedState<P>>) -> thread::JoinHandle<()>
where
    P: StatusPublisher + 'static,
{
    let interval = Duration::from_secs(state.poll_interval_secs());
    thread::spawn(move || loop {
        thread::sleep(interval);
        state.run_tick("scheduled");
    })
}
