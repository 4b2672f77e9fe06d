//! Countdown gating OTP resends.
//!
//! A [`ResendCooldown`] owns at most one ticker task. The remaining seconds
//! are published through a `tokio::sync::watch` channel so the socket loop
//! can forward each tick to the browser. Restarting aborts and awaits the
//! previous ticker before spawning the next one; dropping the cooldown aborts
//! whatever is still running.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Seconds a user waits between OTP resends.
pub const RESEND_COOLDOWN_SECS: u32 = 65;

const TICK: Duration = Duration::from_secs(1);

/// Resend cooldown with a single background ticker.
///
/// # Examples
/// ```
/// use threads_web::domain::ResendCooldown;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut cooldown = ResendCooldown::new(3);
/// assert!(!cooldown.is_running());
/// cooldown.restart().await;
/// assert_eq!(cooldown.remaining(), 3);
/// # });
/// ```
#[derive(Debug)]
pub struct ResendCooldown {
    total: u32,
    remaining: Arc<watch::Sender<u32>>,
    ticker: Option<JoinHandle<()>>,
    live_tickers: Arc<AtomicUsize>,
}

impl ResendCooldown {
    /// Idle cooldown that counts down from `total` seconds once started.
    pub fn new(total: u32) -> Self {
        Self::with_live_counter(total, Arc::new(AtomicUsize::new(0)))
    }

    /// Idle cooldown whose ticker is counted in `live_tickers`.
    ///
    /// Several cooldowns may share one counter; it then reads the number of
    /// tickers alive across all of them.
    pub fn with_live_counter(total: u32, live_tickers: Arc<AtomicUsize>) -> Self {
        let (remaining, _) = watch::channel(0);
        Self {
            total,
            remaining: Arc::new(remaining),
            ticker: None,
            live_tickers,
        }
    }

    /// Seconds left before another resend is allowed.
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// True while a resend must be refused.
    pub fn is_running(&self) -> bool {
        self.remaining() > 0
    }

    /// Receiver observing every tick.
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.subscribe()
    }

    /// Start counting down from the full period, replacing any running ticker.
    pub async fn restart(&mut self) {
        self.stop().await;
        if self.total == 0 {
            return;
        }
        self.remaining.send_replace(self.total);
        let remaining = Arc::clone(&self.remaining);
        let live = LiveTicker::enter(Arc::clone(&self.live_tickers));
        self.ticker = Some(tokio::spawn(async move {
            let _live = live;
            let mut interval = time::interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                let next = remaining.borrow().saturating_sub(1);
                remaining.send_replace(next);
                if next == 0 {
                    break;
                }
            }
        }));
        debug!(seconds = self.total, "resend cooldown started");
    }

    /// Abort the ticker, wait for it to finish, and reset to zero.
    pub async fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            if let Some(error) = unexpected_exit(ticker.await) {
                warn!(%error, "resend cooldown ticker failed");
            }
        }
        self.remaining.send_replace(0);
    }

    /// Tickers currently alive for this cooldown; never more than one.
    pub fn live_tickers(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live_tickers)
    }
}

/// A ticker that ended by panicking rather than by finishing or being aborted.
fn unexpected_exit(outcome: Result<(), JoinError>) -> Option<JoinError> {
    match outcome {
        Err(error) if !error.is_cancelled() => Some(error),
        _ => None,
    }
}

impl Drop for ResendCooldown {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Counts a ticker as live for as long as its task future exists.
#[derive(Debug)]
struct LiveTicker(Arc<AtomicUsize>);

impl LiveTicker {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveTicker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second_to_zero() {
        let mut cooldown = ResendCooldown::new(RESEND_COOLDOWN_SECS);
        let mut ticks = cooldown.subscribe();
        let started = Instant::now();

        cooldown.restart().await;
        ticks.wait_for(|left| *left == 62).await.expect("ticker alive");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));

        ticks.wait_for(|left| *left == 0).await.expect("ticker alive");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(65) && elapsed < Duration::from_secs(66));
        assert!(!cooldown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_running_ticker() {
        let mut cooldown = ResendCooldown::new(10);
        let live = cooldown.live_tickers();

        for _ in 0..5 {
            cooldown.restart().await;
            time::advance(Duration::from_millis(1_500)).await;
            assert_eq!(live.load(Ordering::SeqCst), 1);
        }
        assert!(cooldown.remaining() <= 10);

        cooldown.stop().await;
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(cooldown.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_ticker() {
        let mut cooldown = ResendCooldown::new(RESEND_COOLDOWN_SECS);
        let live = cooldown.live_tickers();
        cooldown.restart().await;
        assert_eq!(live.load(Ordering::SeqCst), 1);

        drop(cooldown);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_counter_tracks_every_cooldown() {
        let shared = Arc::new(AtomicUsize::new(0));
        let mut first = ResendCooldown::with_live_counter(5, Arc::clone(&shared));
        let mut second = ResendCooldown::with_live_counter(5, Arc::clone(&shared));

        first.restart().await;
        second.restart().await;
        assert_eq!(shared.load(Ordering::SeqCst), 2);

        first.stop().await;
        assert_eq!(shared.load(Ordering::SeqCst), 1);
        time::advance(Duration::from_secs(6)).await;
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(shared.load(Ordering::SeqCst), 0);
        assert!(!second.is_running());
    }

    #[tokio::test]
    async fn zero_length_cooldown_never_runs() {
        let mut cooldown = ResendCooldown::new(0);
        cooldown.restart().await;
        assert!(!cooldown.is_running());
        assert_eq!(cooldown.live_tickers().load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn only_panicking_tickers_count_as_failures() {
        let aborted = tokio::spawn(std::future::pending::<()>());
        aborted.abort();
        assert!(unexpected_exit(aborted.await).is_none());

        let finished = tokio::spawn(async {});
        assert!(unexpected_exit(finished.await).is_none());

        let panicked: JoinHandle<()> = tokio::spawn(async { panic!("ticker bug") });
        let error = unexpected_exit(panicked.await).expect("panic reported");
        assert!(error.is_panic());
    }
}
