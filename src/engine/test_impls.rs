#![allow(missing_docs)]

use crate::{
    config::Config,
    constants::FRAME_SIZE,
    error::{SendError, SendResult},
    transport::Transport,
};
use flume::{Receiver, Sender};
use std::io::{Error as IoError, ErrorKind};

/// Scheduler tick control: live pacing, or scripted execution where tests
/// drive exact tick counts and await their completion.
#[derive(Clone, Debug)]
pub(crate) enum TickStyle {
    Timed,
    /// (tick budget in, completed budget out)
    UntimedWithExecLimit(Receiver<u64>, Sender<u64>),
}

/// One recorded `send_frame` attempt, successful or not.
#[derive(Clone, Debug)]
pub(crate) struct SentFrame {
    pub payload: Vec<u8>,
    pub timestamp: u32,
    pub payload_type: u8,
    pub ok: bool,
}

enum FailurePlan {
    None,
    All,
    Scripted(Vec<bool>),
}

/// Transport double: records every attempt on a channel, with scriptable
/// per-call failures.
pub(crate) struct MockTransport {
    sent: Sender<SentFrame>,
    attempts: u64,
    failure_plan: FailurePlan,
}

impl MockTransport {
    pub fn new() -> (Self, Receiver<SentFrame>) {
        Self::with_plan(FailurePlan::None)
    }

    pub fn failing() -> (Self, Receiver<SentFrame>) {
        Self::with_plan(FailurePlan::All)
    }

    /// `plan[i]` fails the `i`-th attempt; attempts past the end succeed.
    pub fn scripted(plan: Vec<bool>) -> (Self, Receiver<SentFrame>) {
        Self::with_plan(FailurePlan::Scripted(plan))
    }

    fn with_plan(failure_plan: FailurePlan) -> (Self, Receiver<SentFrame>) {
        let (sent, rx) = flume::unbounded();

        (
            Self {
                sent,
                attempts: 0,
                failure_plan,
            },
            rx,
        )
    }
}

impl Transport for MockTransport {
    fn send_frame(&mut self, payload: &[u8; FRAME_SIZE], timestamp: u32, payload_type: u8) -> SendResult {
        let idx = self.attempts as usize;
        self.attempts += 1;

        let fail = match &self.failure_plan {
            FailurePlan::None => false,
            FailurePlan::All => true,
            FailurePlan::Scripted(plan) => plan.get(idx).copied().unwrap_or(false),
        };

        drop(self.sent.send(SentFrame {
            payload: payload.to_vec(),
            timestamp,
            payload_type,
            ok: !fail,
        }));

        if fail {
            Err(SendError::Io(IoError::new(ErrorKind::Other, "scripted failure")))
        } else {
            Ok(())
        }
    }
}

/// Test handle driving the scheduler tick-by-tick.
pub(crate) struct EngineTestHandle {
    ticks: Sender<u64>,
    done: Receiver<u64>,
}

impl EngineTestHandle {
    /// Executes exactly `n` ticks and waits for their completion.
    pub fn tick(&self, n: u64) {
        if n == 0 {
            panic!("Number of ticks to advance the playout scheduler must be >= 1.");
        }
        self.ticks.send(n).unwrap();
        assert_eq!(self.done.recv().unwrap(), n);
    }
}

/// Rewrites `config` for scripted ticking, returning the driving handle.
pub(crate) fn manual_cfg(config: Config) -> (Config, EngineTestHandle) {
    let (tick_tx, tick_rx) = flume::unbounded();
    let (done_tx, done_rx) = flume::unbounded();

    (
        config.tick_style(TickStyle::UntimedWithExecLimit(tick_rx, done_tx)),
        EngineTestHandle {
            ticks: tick_tx,
            done: done_rx,
        },
    )
}
