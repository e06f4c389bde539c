//! Level scheduler: ordered wave steps of parallel runners.
//!
//! A step's runners start together and the level moves on only once every
//! one of them has finished. After the last step the level either loops
//! back to step 0 or completes.

use tracing::{info, warn};

use skyward_core::config::LevelConfig;
use skyward_core::events::WaveEvent;

use crate::runner::WaveRunner;
use crate::stage::Stage;

pub struct Level {
    config: LevelConfig,
    step: usize,
    runners: Vec<WaveRunner>,
    running: bool,
    complete: bool,
    loops: u32,
    on_complete: Option<Box<dyn FnMut(&str)>>,
}

impl Level {
    pub fn new(config: LevelConfig) -> Self {
        Self {
            config,
            step: 0,
            runners: Vec::new(),
            running: false,
            complete: false,
            loops: 0,
            on_complete: None,
        }
    }

    /// Called once with the level name when the last step finishes.
    /// Never called for looping levels.
    pub fn on_complete(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn active_runners(&self) -> &[WaveRunner] {
        &self.runners
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn loops_completed(&self) -> u32 {
        self.loops
    }

    /// Launch step 0.
    pub fn start(&mut self, stage: &mut Stage) {
        if self.running {
            warn!("Level `{}` already started", self.config.name);
            return;
        }
        info!(
            "Starting level `{}` ({} steps{})",
            self.config.name,
            self.config.steps.len(),
            if self.config.looping { ", looping" } else { "" }
        );
        self.running = true;
        self.complete = false;
        self.step = 0;
        if self.config.steps.is_empty() {
            warn!("Level `{}` has no steps", self.config.name);
            self.finish(stage);
            return;
        }
        self.launch_step(stage);
    }

    pub fn update(&mut self, stage: &mut Stage, time: f64, delta: f64) {
        if !self.running {
            return;
        }
        for runner in &mut self.runners {
            runner.update(stage, time, delta);
        }
        self.runners.retain_mut(|runner| {
            if runner.is_finished() {
                runner.destroy(stage);
                false
            } else {
                true
            }
        });
        if self.runners.is_empty() {
            self.advance(stage);
        }
    }

    /// Tear down every active runner. The level stays inert afterwards.
    pub fn destroy(&mut self, stage: &mut Stage) {
        for mut runner in self.runners.drain(..) {
            runner.destroy(stage);
        }
        self.running = false;
    }

    fn advance(&mut self, stage: &mut Stage) {
        if self.step + 1 < self.config.steps.len() {
            self.step += 1;
        } else if self.config.looping {
            self.loops += 1;
            self.step = 0;
            info!("Level `{}` looped ({} so far)", self.config.name, self.loops);
            stage.events.push(WaveEvent::LevelLooped { loops: self.loops });
        } else {
            self.finish(stage);
            return;
        }
        self.launch_step(stage);
    }

    fn launch_step(&mut self, stage: &mut Stage) {
        let Some(directives) = self.config.steps.get(self.step) else {
            return;
        };
        for (index, directive) in directives.iter().enumerate() {
            if directive.tactic.is_none() {
                warn!(
                    "Level `{}` step {} directive {} has no tactic, skipping",
                    self.config.name, self.step, index
                );
                continue;
            }
            let label = format!("{}/{}/{}", self.config.name, self.step, index);
            self.runners.push(WaveRunner::new(label, directive.clone()));
        }
        info!(
            "Level `{}` step {} started with {} runners",
            self.config.name,
            self.step,
            self.runners.len()
        );
        stage.events.push(WaveEvent::StepStarted {
            step: self.step,
            runners: self.runners.len(),
        });
    }

    fn finish(&mut self, stage: &mut Stage) {
        info!("Level `{}` complete", self.config.name);
        self.running = false;
        self.complete = true;
        stage.events.push(WaveEvent::LevelComplete {
            name: self.config.name.clone(),
        });
        if let Some(callback) = &mut self.on_complete {
            callback(&self.config.name);
        }
    }
}
