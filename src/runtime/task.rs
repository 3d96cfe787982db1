//! Recurring tasks on the browser event loop
//!
//! The dashboard refresh and the demo generator are both "sleep, check the
//! token, tick" loops. The tick closure runs synchronously between sleeps,
//! so it may borrow shared state freely as long as it releases it before
//! returning:
//!
//! ```text
//! loop {
//!     sleep(interval).await;       // no borrow held
//!     if token.is_cancelled() { break }
//!     tick();                      // brief borrows only
//! }
//! ```

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

/// Shared cancellation flag. Cancelling more than once is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the call that actually cancelled.
    pub fn cancel(&self) -> bool {
        !self.cancelled.replace(true)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Run `tick` after every `sleep()` until `token` is cancelled.
///
/// Returns the number of ticks executed.
pub async fn run_recurring<S, Fut, F>(token: CancellationToken, mut sleep: S, mut tick: F) -> u64
where
    S: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    F: FnMut(),
{
    let mut ticks = 0;
    while !token.is_cancelled() {
        sleep().await;
        if token.is_cancelled() {
            break;
        }
        tick();
        ticks += 1;
    }
    ticks
}

/// Handle to a loop spawned with `spawn_local`. Dropping the handle cancels it.
#[derive(Debug)]
pub struct RecurringTask {
    name: &'static str,
    token: CancellationToken,
}

impl RecurringTask {
    pub fn spawn<F>(name: &'static str, interval_ms: u32, tick: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let token = CancellationToken::new();
        let loop_token = token.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let ticks = run_recurring(
                loop_token,
                || gloo_timers::future::TimeoutFuture::new(interval_ms),
                tick,
            )
            .await;
            log::debug!("⏹️ {} loop exited after {} ticks", name, ticks);
        });

        log::info!("▶️ Started {} loop ({}ms)", name, interval_ms);
        Self { name, token }
    }

    /// Stop the loop. Safe to call repeatedly.
    pub fn cancel(&self) {
        if self.token.cancel() {
            log::info!("⏹️ Cancelled {} loop", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::ready;

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_run_until_cancelled() {
        let token = CancellationToken::new();
        let counter = Rc::new(Cell::new(0));

        let tick_token = token.clone();
        let tick_counter = counter.clone();
        let ticks = block_on(run_recurring(token, || ready(()), move || {
            tick_counter.set(tick_counter.get() + 1);
            if tick_counter.get() == 3 {
                tick_token.cancel();
            }
        }));

        assert_eq!(ticks, 3);
        assert_eq!(counter.get(), 3);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let ticks = block_on(run_recurring(token, || ready(()), || panic!("should not tick")));
        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_cancel_during_sleep_skips_tick() {
        let token = CancellationToken::new();
        let sleep_token = token.clone();
        let ticks = block_on(run_recurring(
            token,
            move || {
                sleep_token.cancel();
                ready(())
            },
            || panic!("should not tick"),
        ));
        assert_eq!(ticks, 0);
    }
}
