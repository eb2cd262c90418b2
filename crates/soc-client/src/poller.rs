use crate::engine::{EngineMsg, TickKind};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug)]
pub struct Poller {
    kind: TickKind,
    period: Duration,
    tx: UnboundedSender<EngineMsg>,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(kind: TickKind, period: Duration, tx: UnboundedSender<EngineMsg>) -> Self {
        Self {
            kind,
            period,
            tx,
            task: None,
        }
    }

    pub fn run(&mut self) {
        if self.is_running() {
            return;
        }

        let kind = self.kind;
        let period = self.period;
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(EngineMsg::Tick(kind)).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn reset(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.reset();
    }
}
