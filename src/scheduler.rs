//! One cancellable periodic poll per channel.
//!
//! Every fetch is tagged with the channel generation at the time it was
//! issued and a global sequence number. `admit` compares both against the
//! lane state, so results that arrive after `stop` or behind a newer
//! result are discarded instead of overwriting what is on screen.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, trace};

use crate::{
    config::PollIntervals,
    error::FetchError,
    fetcher::Backend,
    models::{Channel, ChannelSnapshot},
};

#[derive(Debug)]
pub struct PollOutcome {
    pub channel: Channel,
    pub generation: u64,
    pub seq: u64,
    pub result: Result<ChannelSnapshot, FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Apply,
    /// The channel is not running.
    Stopped,
    /// Issued before the channel was last (re)started.
    Superseded,
    /// A newer fetch on the same channel was already admitted.
    OutOfOrder,
}

#[derive(Default)]
struct Lane {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    last_admitted: Option<u64>,
}

impl Lane {
    fn running(&self) -> bool {
        self.timer.is_some()
    }
}

pub struct Scheduler<B: Backend> {
    backend: Arc<B>,
    runtime: Handle,
    intervals: PollIntervals,
    outcomes: mpsc::UnboundedSender<PollOutcome>,
    lanes: HashMap<Channel, Lane>,
    seq: Arc<AtomicU64>,
}

impl<B: Backend> Scheduler<B> {
    pub fn new(
        backend: Arc<B>,
        runtime: Handle,
        intervals: PollIntervals,
        outcomes: mpsc::UnboundedSender<PollOutcome>,
    ) -> Self {
        Self {
            backend,
            runtime,
            intervals,
            outcomes,
            lanes: Channel::ALL.iter().map(|c| (*c, Lane::default())).collect(),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lane_mut(&mut self, channel: Channel) -> &mut Lane {
        self.lanes.entry(channel).or_default()
    }

    pub fn is_running(&self, channel: Channel) -> bool {
        self.lanes.get(&channel).is_some_and(Lane::running)
    }

    pub fn generation(&self, channel: Channel) -> u64 {
        self.lanes.get(&channel).map_or(0, |l| l.generation)
    }

    /// Starts (or restarts) polling; the first fetch is issued immediately.
    pub fn start(&mut self, channel: Channel) {
        let period = self.intervals.period(channel);
        let backend = Arc::clone(&self.backend);
        let outcomes = self.outcomes.clone();
        let seq = Arc::clone(&self.seq);

        let lane = self.lanes.entry(channel).or_default();
        if let Some(old) = lane.timer.take() {
            old.abort();
        }
        lane.generation += 1;
        lane.last_admitted = None;
        let generation = lane.generation;

        debug!(channel = channel.as_str(), ?period, generation, "starting poll");
        let handle = self.runtime.spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                spawn_fetch(&backend, &outcomes, &seq, channel, generation);
            }
        });
        self.lane_mut(channel).timer = Some(handle);
    }

    /// Cancels the timer. In-flight fetches finish but will not be admitted.
    pub fn stop(&mut self, channel: Channel) {
        if let Some(timer) = self.lane_mut(channel).timer.take() {
            timer.abort();
            debug!(channel = channel.as_str(), "stopped poll");
        }
    }

    pub fn start_all(&mut self) {
        for channel in Channel::ALL {
            self.start(channel);
        }
    }

    pub fn stop_all(&mut self) {
        for channel in Channel::ALL {
            self.stop(channel);
        }
    }

    /// One out-of-band fetch tagged with the current generation. Returns the
    /// sequence number its outcome will carry.
    pub fn refresh(&self, channel: Channel) -> u64 {
        let _guard = self.runtime.enter();
        spawn_fetch(
            &self.backend,
            &self.outcomes,
            &self.seq,
            channel,
            self.generation(channel),
        )
    }

    pub fn admit(&mut self, outcome: &PollOutcome) -> Admission {
        let lane = self.lane_mut(outcome.channel);
        let verdict = if !lane.running() {
            Admission::Stopped
        } else if outcome.generation != lane.generation {
            Admission::Superseded
        } else if lane.last_admitted.is_some_and(|last| outcome.seq < last) {
            Admission::OutOfOrder
        } else {
            lane.last_admitted = Some(outcome.seq);
            Admission::Apply
        };
        if verdict != Admission::Apply {
            trace!(
                channel = outcome.channel.as_str(),
                seq = outcome.seq,
                ?verdict,
                "discarding poll outcome"
            );
        }
        verdict
    }
}

impl<B: Backend> Drop for Scheduler<B> {
    fn drop(&mut self) {
        for lane in self.lanes.values_mut() {
            if let Some(timer) = lane.timer.take() {
                timer.abort();
            }
        }
    }
}

fn spawn_fetch<B: Backend>(
    backend: &Arc<B>,
    outcomes: &mpsc::UnboundedSender<PollOutcome>,
    seq: &AtomicU64,
    channel: Channel,
    generation: u64,
) -> u64 {
    let seq = seq.fetch_add(1, Ordering::Relaxed) + 1;
    let backend = Arc::clone(backend);
    let outcomes = outcomes.clone();
    tokio::spawn(async move {
        let result = backend.fetch(channel).await;
        // receiver gone means the console shut down
        let _ = outcomes.send(PollOutcome {
            channel,
            generation,
            seq,
            result,
        });
    });
    seq
}
