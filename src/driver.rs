use std::thread;
use std::time::Duration;

use crate::app_types::GenerationReport;
use crate::engine::Engine;
use crate::error::Result;

/// receives a report after every generation that actually ran
pub trait ProgressObserver {
    fn on_generation(&mut self, report: &GenerationReport);
}

impl<F: FnMut(&GenerationReport)> ProgressObserver for F {
    fn on_generation(&mut self, report: &GenerationReport) {
        self(report)
    }
}

/// logs every `interval` generations and always on the last one
pub struct LogObserver {
    interval: u64,
    since_last: u64,
}

impl LogObserver {
    /// `interval == 0` only logs the final generation
    pub fn new(interval: u64) -> Self {
        Self { interval, since_last: 0 }
    }
}

impl ProgressObserver for LogObserver {
    fn on_generation(&mut self, report: &GenerationReport) {
        self.since_last += 1;
        let due = self.interval > 0 && self.since_last >= self.interval;
        if due || report.finished {
            self.since_last = 0;
            log::info!(
                "generation {}/{}: best fitness {:.5}, compliance {:.5}",
                report.generation,
                report.max_generation,
                report.best_fitness,
                report.compliance
            );
        }
    }
}

/// how fast the driver ticks the engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    /// back to back
    #[default]
    Immediate,
    /// sleep between generations
    Interval(Duration),
}

/// synchronous host loop. the engine never schedules itself; this decides when it ticks
#[derive(Clone, Copy, Debug, Default)]
pub struct Driver {
    pacing: Pacing,
}

impl Driver {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// run `generations` more generations. on an idle engine that is the whole budget
    pub fn generate(
        &self,
        engine: &mut Engine,
        generations: u64,
        observer: &mut dyn ProgressObserver,
    ) -> Result<GenerationReport> {
        engine.schedule(generations);
        self.run_to_completion(engine, observer)
    }

    /// tick until the current budget is spent. returns the last report
    pub fn run_to_completion(&self, engine: &mut Engine, observer: &mut dyn ProgressObserver) -> Result<GenerationReport> {
        profiling::scope!("Driver::run_to_completion");
        loop {
            let result = engine.step()?;
            if !result.advanced {
                return Ok(result.report);
            }
            observer.on_generation(&result.report);
            if result.report.finished {
                return Ok(result.report);
            }
            if let Pacing::Interval(delay) = self.pacing {
                thread::sleep(delay);
            }
        }
    }
}
