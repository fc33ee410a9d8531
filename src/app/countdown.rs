// SPDX-License-Identifier: GPL-3.0-only

//! Countdown before a capture fires
//!
//! Ticks `initial, initial - 1, ..., 0` one second apart, then fires one
//! second after the final tick. Deadlines are measured from the start
//! instant, so a late wakeup never delays the following ticks.

use crate::constants::{COUNTDOWN_FIRE_GRACE, COUNTDOWN_TICK, DEFAULT_COUNTDOWN_SECONDS};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

/// One countdown step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Seconds left to show
    Tick(u32),
    /// Take the picture
    Fire,
}

/// How a countdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Fired,
    /// Aborted while `remaining` was on screen
    Aborted { remaining: u32 },
}

/// Countdown timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    initial: u32,
    tick: Duration,
    fire_grace: Duration,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECONDS)
    }
}

impl Countdown {
    pub fn new(initial: u32) -> Self {
        Self::with_timing(initial, COUNTDOWN_TICK, COUNTDOWN_FIRE_GRACE)
    }

    pub fn with_timing(initial: u32, tick: Duration, fire_grace: Duration) -> Self {
        Self {
            initial,
            tick,
            fire_grace,
        }
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// Time from start to fire
    pub fn total_duration(&self) -> Duration {
        self.tick * self.initial + self.fire_grace
    }

    /// Lazy event stream; timing starts on first poll
    pub fn events(self) -> impl Stream<Item = CountdownEvent> + Send + 'static {
        async_stream::stream! {
            let start = Instant::now();

            for elapsed_ticks in 0..=self.initial {
                sleep_until(start + self.tick * elapsed_ticks).await;
                yield CountdownEvent::Tick(self.initial - elapsed_ticks);
            }

            sleep_until(start + self.tick * self.initial + self.fire_grace).await;
            yield CountdownEvent::Fire;
        }
    }

    /// Run to completion unless `abort` resolves first
    ///
    /// `on_tick` sees every tick value. After an abort nothing else is
    /// emitted and the capture must not fire.
    pub async fn run<A, F>(self, abort: A, mut on_tick: F) -> CountdownOutcome
    where
        A: Future<Output = ()>,
        F: FnMut(u32),
    {
        info!(seconds = self.initial, "Countdown started");

        let events = self.events();
        futures::pin_mut!(events);
        futures::pin_mut!(abort);
        let mut remaining = self.initial;

        loop {
            tokio::select! {
                biased;
                _ = &mut abort => {
                    info!(remaining, "Countdown aborted");
                    return CountdownOutcome::Aborted { remaining };
                }
                event = events.next() => match event {
                    Some(CountdownEvent::Tick(n)) => {
                        remaining = n;
                        debug!(remaining = n, "Countdown tick");
                        on_tick(n);
                    }
                    Some(CountdownEvent::Fire) | None => {
                        info!("Countdown complete");
                        return CountdownOutcome::Fired;
                    }
                },
            }
        }
    }
}
