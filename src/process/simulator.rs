use crate::error::{Error, Result};
use crate::process::process::Process;
use crate::process::report::RunReport;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::{Path, PathBuf};

const DEFAULT_SEED: u64 = 0b1110110001110101011000111101;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    steps: usize,
    seed: u64,
    trace_path: Option<PathBuf>,
    report_state_step: usize,
}

#[derive(Serialize)]
#[serde(tag = "evt")]
pub enum TraceFrame<'a, FrameT: Serialize> {
    Config(ConfigTraceFrame<'a>),
    Step(StepTraceFrame<'a, FrameT>),
}

#[derive(Serialize)]
pub struct ConfigTraceFrame<'a> {
    steps: usize,
    process: &'a serde_json::Value,
}

#[derive(Serialize)]
pub struct StepTraceFrame<'a, FrameT: Serialize> {
    step: usize,
    frame: &'a FrameT,
}

impl SimulatorConfig {
    pub fn new() -> Self {
        SimulatorConfig {
            steps: 10,
            seed: DEFAULT_SEED,
            trace_path: None,
            report_state_step: 1,
        }
    }

    pub fn set_steps(&mut self, steps: usize) {
        self.steps = steps;
    }
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
    pub fn set_trace_path(&mut self, trace_path: &Path) {
        self.trace_path = Some(trace_path.into());
    }
    /// Every `report_step`-th step is written to the trace, 0 disables step
    /// frames.
    pub fn set_report_state_step(&mut self, report_step: usize) {
        self.report_state_step = report_step;
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a [`Process`] for a fixed number of steps with its own random source.
pub struct Simulator<'a, ProcessT: Process> {
    process: &'a mut ProcessT,
    rng: SmallRng,
    step: usize,
    config: &'a SimulatorConfig,
    trace_file: Option<BufWriter<File>>,
}

impl<'a, ProcessT: Process> Simulator<'a, ProcessT> {
    /// Seeds the simulator from `outer_rng` when given, otherwise from the
    /// configured seed.
    pub fn new(
        config: &'a SimulatorConfig,
        outer_rng: Option<&mut impl Rng>,
        process: &'a mut ProcessT,
    ) -> Result<Self> {
        let rng = match outer_rng {
            Some(r) => SmallRng::from_rng(r).map_err(|e| Error::invalid("rng", e))?,
            None => SmallRng::seed_from_u64(config.seed),
        };
        let trace_file = config
            .trace_path
            .as_ref()
            .map(|path| {
                File::create(path).map(BufWriter::new).map_err(|source| Error::Io {
                    operation: format!("create trace file {}", path.display()),
                    source,
                })
            })
            .transpose()?;
        Ok(Simulator {
            process,
            rng,
            step: 0,
            config,
            trace_file,
        })
    }

    fn write_line<T: Serialize>(&mut self, frame: &T) -> Result<()> {
        if let Some(file) = &mut self.trace_file {
            let line = serde_json::to_string(frame)?;
            writeln!(file, "{}", line).map_err(|source| Error::Io {
                operation: "write trace".to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn step(&mut self) -> Result<ProcessT::FrameT> {
        let frame = self.process.step(&mut self.rng)?;
        self.step += 1;
        let period = self.config.report_state_step;
        if period > 0 && self.step % period == 0 {
            let trace = TraceFrame::Step(StepTraceFrame {
                step: self.step,
                frame: &frame,
            });
            self.write_line(&trace)?;
        }
        Ok(frame)
    }

    pub fn run(&mut self) -> Result<RunReport<ProcessT::FrameT>> {
        let configuration = self.process.configuration();
        self.write_line(&TraceFrame::<'_, ProcessT::FrameT>::Config(ConfigTraceFrame {
            steps: self.config.steps,
            process: &configuration,
        }))?;
        let mut frames = Vec::with_capacity(self.config.steps);
        for _i in 0..self.config.steps {
            frames.push(self.step()?);
        }
        if let Some(file) = &mut self.trace_file {
            file.flush().map_err(|source| Error::Io {
                operation: "flush trace".to_string(),
                source,
            })?;
        }
        Ok(RunReport {
            steps: self.step,
            frames,
        })
    }
}
