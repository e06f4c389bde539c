//! Wave runner: one spawn directive's DELAY -> RUNNING -> FINISHED lifecycle.
//!
//! Spawning is always deferred through the runner's own queue, even with a
//! zero start delay, so a whole parallel step spawns on the same future tick
//! regardless of construction order. Repeated directives stay `Running`
//! between instances and finish after the last one completes.

use tracing::{debug, warn};

use skyward_core::config::SpawnDirective;
use skyward_core::events::WaveEvent;

use crate::deferred::DeferredQueue;
use crate::formation::FormationSetup;
use crate::stage::Stage;
use crate::tactic::Tactic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunnerState {
    /// Waiting for the start delay.
    #[default]
    Delay,
    Running,
    /// Terminal.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerAction {
    Spawn,
}

pub struct WaveRunner {
    label: String,
    directive: SpawnDirective,
    state: RunnerState,
    queue: DeferredQueue<RunnerAction>,
    tactic: Option<Tactic>,
    /// Instances spawned so far.
    spawned: u32,
}

impl WaveRunner {
    pub fn new(label: impl Into<String>, directive: SpawnDirective) -> Self {
        let mut queue = DeferredQueue::new();
        queue.schedule(directive.start_delay_ms, RunnerAction::Spawn);
        Self {
            label: label.into(),
            directive,
            state: RunnerState::Delay,
            queue,
            tactic: None,
            spawned: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == RunnerState::Finished
    }

    pub fn tactic(&self) -> Option<&Tactic> {
        self.tactic.as_ref()
    }

    /// Total instances this directive runs.
    pub fn instances(&self) -> u32 {
        self.directive.repeat.map_or(1, |r| r.count.max(1))
    }

    pub fn update(&mut self, stage: &mut Stage, time: f64, delta: f64) {
        if self.state == RunnerState::Finished {
            return;
        }
        let due = self.queue.advance(delta);
        if due.contains(&RunnerAction::Spawn) {
            self.spawn_instance(stage, time);
            return;
        }

        let Some(tactic) = &mut self.tactic else {
            return;
        };
        tactic.update(stage, time, delta);
        if !tactic.is_complete() {
            return;
        }
        tactic.destroy(stage);
        self.tactic = None;

        if self.spawned < self.instances() {
            let interval = self.directive.repeat.map_or(0.0, |r| r.interval_ms);
            debug!(
                "Runner {} instance {} done, next in {}ms",
                self.label, self.spawned, interval
            );
            self.queue.schedule(interval, RunnerAction::Spawn);
        } else {
            self.finish(stage);
        }
    }

    fn spawn_instance(&mut self, stage: &mut Stage, time: f64) {
        let Some(config) = &self.directive.tactic else {
            warn!("Runner {} has no tactic, finishing without spawning", self.label);
            self.finish(stage);
            return;
        };
        let mut tactic = Tactic::from_config(config);
        tactic.initialize(FormationSetup {
            config: self.directive.formation.clone(),
            ships: self.directive.ships.clone(),
            layer: self.directive.layer,
        });
        tactic.spawn(stage, time);
        self.spawned += 1;
        self.tactic = Some(tactic);
        if self.state == RunnerState::Delay {
            debug!("Runner {} running", self.label);
            self.state = RunnerState::Running;
        }
    }

    fn finish(&mut self, stage: &mut Stage) {
        debug!("Runner {} finished", self.label);
        self.state = RunnerState::Finished;
        stage.events.push(WaveEvent::RunnerFinished {
            label: self.label.clone(),
        });
    }

    /// Cancel pending spawns and destroy the live tactic. Safe to call twice.
    pub fn destroy(&mut self, stage: &mut Stage) {
        self.queue.cancel_all();
        if let Some(mut tactic) = self.tactic.take() {
            tactic.destroy(stage);
        }
        self.state = RunnerState::Finished;
    }
}
