use std::sync::{mpsc, Arc};
use std::thread;

use crate::app_types::{EngineCommand, EngineUpdate, GenerationReport};
use crate::driver::Pacing;
use crate::engine::Engine;
use crate::error::{EvolveError, Result};

/// host side of a background engine thread
pub struct EngineHandle {
    pub commands: mpsc::Sender<EngineCommand>,
    pub updates: mpsc::Receiver<EngineUpdate>,
    join: thread::JoinHandle<Result<Engine>>,
}

impl EngineHandle {
    #[inline]
    pub fn send(&self, cmd: EngineCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// stop the thread and hand the engine back (or the error that ended the run)
    pub fn stop(self) -> Result<Engine> {
        let _ = self.commands.send(EngineCommand::Stop);
        self.join()
    }

    /// wait for the thread without asking it to stop
    pub fn join(self) -> Result<Engine> {
        self.join
            .join()
            .map_err(|_| EvolveError::WorkerPool("engine thread panicked".to_owned()))?
    }
}

/// spawn a thread that owns `engine` and ticks it while running.
/// `preview_every` attaches a display-size render to every n-th update (0 = only the last)
pub fn spawn_engine_thread(engine: Engine, pacing: Pacing, preview_every: u64) -> Result<EngineHandle> {
    profiling::scope!("spawn_engine_thread");
    let (cmd_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let join = thread::Builder::new()
        .name("engine".to_owned())
        .spawn(move || engine_loop(engine, pacing, preview_every, command_rx, update_tx))?;

    Ok(EngineHandle { commands: cmd_tx, updates: update_rx, join })
}

fn engine_loop(
    mut engine: Engine,
    pacing: Pacing,
    preview_every: u64,
    command_rx: mpsc::Receiver<EngineCommand>,
    update_tx: mpsc::Sender<EngineUpdate>,
) -> Result<Engine> {
    let mut running = false;

    // initial state
    let _ = update_tx.send(snapshot(&engine, engine.report(false), true));

    loop {
        profiling::scope!("engine_thread_loop");

        // idle or done: block for the next command instead of spinning
        let cmd = if running && !engine.is_finished() {
            match command_rx.try_recv() {
                Ok(cmd) => Some(cmd),
                Err(mpsc::TryRecvError::Empty) => None,
                Err(mpsc::TryRecvError::Disconnected) => break,
            }
        } else {
            match command_rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            }
        };

        match cmd {
            Some(EngineCommand::Start) => running = true,
            Some(EngineCommand::Pause) => running = false,
            Some(EngineCommand::Stop) => break,
            Some(EngineCommand::Extend(n)) => {
                engine.extend(n);
                log::info!("generation budget raised to {}", engine.state().max_generation);
            }
            None => {}
        }

        if running && !engine.is_finished() {
            profiling::scope!("evolution_step");
            let result = engine.step()?;
            let report = result.report;
            let preview = report.finished || (preview_every > 0 && report.generation % preview_every == 0);
            if update_tx.send(snapshot(&engine, report, preview)).is_err() {
                // host dropped the receiver
                break;
            }
            if report.finished {
                log::info!("run finished at generation {}", report.generation);
            } else if let Pacing::Interval(delay) = pacing {
                thread::sleep(delay);
            }
        }
    }
    Ok(engine)
}

fn snapshot(engine: &Engine, report: GenerationReport, preview: bool) -> EngineUpdate {
    let (width, height) = engine.display_size();
    EngineUpdate {
        report,
        best_rgba: preview.then(|| Arc::from(engine.render_best())),
        width,
        height,
    }
}
