use crate::drug::DrugResponseEngine;
use crate::engine::FrameEngine;
use crate::omics::OmicsEngine;
use crate::scheduler::{seconds_to_us, DueTask, TaskKind, TickScheduler};
use crate::tumor::TumorEngine;
use anyhow::{anyhow, Result};
use biosim_common::{CellCensus, FrameRecord, Populations, SimulationConfig};
use log::{debug, info};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: u64,
    pub sim_time_s: f64,
    pub molecules_spawned: u64,
    pub live_molecules: usize,
    pub final_census: CellCensus,
    pub records: usize,
}

/// Headless stand-in for the UI shell: owns the three engines and feeds them
/// from one cooperative scheduler.
pub struct Session {
    config: SimulationConfig,
    tumor: TumorEngine,
    omics: OmicsEngine,
    drug: DrugResponseEngine,
    scheduler: TickScheduler,
    frame_interval_us: u64,
    spawn_interval_us: u64,
    frames: u64,
    molecules_spawned: u64,
    records: Vec<FrameRecord>,
}

impl Session {
    /// Builds and initializes every engine from `config`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let bounds = config.bounds();

        let mut tumor = TumorEngine::new(config.tumor.clone(), config.engine_seed(0));
        let mut omics = OmicsEngine::new(config.omics.clone(), config.engine_seed(1));
        let mut drug = DrugResponseEngine::new(config.drug.clone(), config.engine_seed(2));
        tumor.initialize(bounds)?;
        omics.initialize(bounds)?;
        drug.initialize(bounds)?;

        let frame_interval_us = seconds_to_us(config.timing.frame_interval_s);
        let spawn_interval_us = seconds_to_us(config.drug_trigger.spawn_interval_s);

        let mut scheduler = TickScheduler::new();
        scheduler.schedule_periodic(TaskKind::Frame, frame_interval_us, frame_interval_us);
        if let Some(at) = config.drug_trigger.activate_at_s {
            scheduler.schedule_once(TaskKind::ActivateDrug, seconds_to_us(at));
        }

        info!(
            "Session ready: {}x{} bounds, frame every {} us, seed {}.",
            bounds.width, bounds.height, frame_interval_us, config.initial_conditions.seed
        );

        Ok(Self {
            config,
            tumor,
            omics,
            drug,
            scheduler,
            frame_interval_us,
            spawn_interval_us,
            frames: 0,
            molecules_spawned: 0,
            records: Vec::new(),
        })
    }

    /// Runs `timing.total_ticks` frames, recording at the configured interval
    /// plus the initial and final states.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.records.is_empty() {
            self.record()?;
        }
        let total = self.config.timing.total_ticks;
        info!("Running {} frames...", total);
        self.run_frames(total.saturating_sub(self.frames))?;
        if self.records.last().map(|r| r.frame) != Some(self.frames) {
            self.record()?;
        }
        Ok(self.summary())
    }

    /// Dispatches scheduler tasks until `count` more frames have been stepped.
    pub fn run_frames(&mut self, count: u64) -> Result<()> {
        let target = self.frames + count;
        while self.frames < target {
            let task = self
                .scheduler
                .pop_due(u64::MAX)
                .ok_or_else(|| anyhow!("scheduler has no pending tasks"))?;
            self.dispatch(task)?;
        }
        Ok(())
    }

    /// The single "add drug" input. Spawning starts one interval from now.
    pub fn activate_drug(&mut self) {
        let now = self.scheduler.now_us();
        self.start_treatment(now);
    }

    fn dispatch(&mut self, task: DueTask) -> Result<()> {
        match task.kind {
            TaskKind::Frame => self.on_frame()?,
            TaskKind::SpawnMolecule => {
                if self.drug.spawn_tick()?.is_some() {
                    self.molecules_spawned += 1;
                }
            }
            TaskKind::ActivateDrug => self.start_treatment(task.due_us),
        }
        Ok(())
    }

    fn start_treatment(&mut self, now_us: u64) {
        if self.drug.activate() {
            let interval = self.spawn_interval_us;
            self.scheduler
                .schedule_periodic(TaskKind::SpawnMolecule, now_us + interval, interval);
        }
    }

    fn on_frame(&mut self) -> Result<()> {
        let dt = self.frame_interval_us as f32 / 1_000_000.0;
        self.tumor.step(dt)?;
        self.omics.step(dt)?;
        self.drug.step(dt)?;
        self.frames += 1;

        if self.frames % self.config.timing.record_interval_ticks == 0 {
            self.record()?;
        }
        Ok(())
    }

    /// Appends a [`FrameRecord`] for the current state.
    pub fn record(&mut self) -> Result<()> {
        let tumor = self.tumor.snapshot()?;
        let omics = self.omics.snapshot()?;
        let drug = self.drug.snapshot()?;
        let time_s = self.scheduler.now_s();

        debug!(
            "Frame {} ({:.2} s): survival {:.1}%, apoptosis {:.1}%, {} molecules.",
            self.frames,
            time_s,
            drug.metrics.survival_rate.value,
            drug.metrics.apoptosis_rate.value,
            drug.molecules.len()
        );

        let record = FrameRecord {
            frame: self.frames,
            time_s,
            tumor: tumor.metrics,
            omics: omics.metrics,
            drug: drug.metrics,
            live_molecules: drug.molecules.len() as u32,
            populations: if self.config.output.include_populations {
                Some(Populations { tumor, omics, drug })
            } else {
                None
            },
        };
        self.records.push(record);
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        let final_census = self
            .records
            .last()
            .map(|r| r.drug.census)
            .unwrap_or_default();
        RunSummary {
            frames: self.frames,
            sim_time_s: self.scheduler.now_s(),
            molecules_spawned: self.molecules_spawned,
            live_molecules: self.drug.molecule_count(),
            final_census,
            records: self.records.len(),
        }
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tumor(&self) -> &TumorEngine {
        &self.tumor
    }

    pub fn omics(&self) -> &OmicsEngine {
        &self.omics
    }

    pub fn drug(&self) -> &DrugResponseEngine {
        &self.drug
    }
}
