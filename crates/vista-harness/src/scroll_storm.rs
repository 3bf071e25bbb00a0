#![forbid(unsafe_code)]

//! Scroll storm generator and replay harness.
//!
//! Generates deterministic sequences of scroll and resize events, replays
//! them against a [`CollectionView`], and records every step as JSONL so a
//! failing run can be replayed exactly.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"storm_start","case":"burst_50","seed":42,"pattern":"burst","event_count":50,"checksum":"..."}
//! {"event":"storm_step","idx":0,"step":{"kind":"scroll","offset":1620.5},"offset":1620.5,"phase":"items","first":52,"last":99,"rendered":48,"load_requested":true}
//! {"event":"storm_complete","steps":50,"load_requests":1,"max_live":48,"created":48,"violations":0,"window_checksum":"..."}
//! ```
//!
//! # Usage
//!
//! ```
//! use vista_harness::scroll_storm::{ScrollStorm, StormConfig, StormLog, StormPattern};
//! use vista_core::event::CollectionEvent;
//! use vista_core::geometry::Size;
//! use vista_widgets::{CollectionConfig, CollectionView};
//!
//! let mut view = CollectionView::new(
//!     CollectionConfig::default(),
//!     (0..100u64).collect(),
//!     true,
//!     |id: &u64, _selected: bool| *id,
//! );
//! view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));
//!
//! let storm = ScrollStorm::new(
//!     StormConfig::default()
//!         .with_seed(7)
//!         .with_max_offset(view.layout().max_scroll_offset())
//!         .with_pattern(StormPattern::Burst { count: 50 }),
//! );
//! let mut log = StormLog::new();
//! let summary = storm.replay(&mut view, &mut log);
//! assert_eq!(summary.load_requests, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use vista_core::event::CollectionEvent;
use vista_core::geometry::Size;
use vista_widgets::{CollectionView, ItemRenderer, Keyed, RenderPhase};

// ============================================================================
// Configuration
// ============================================================================

/// One host input in a storm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StormStep {
    /// Absolute scroll.
    Scroll {
        /// Target offset, passed through unclamped.
        offset: f32,
    },
    /// Relative scroll.
    ScrollBy {
        /// Signed delta.
        delta: f32,
    },
    /// Container resize.
    Resize {
        /// New width.
        width: f32,
        /// New height.
        height: f32,
    },
}

impl StormStep {
    /// The host event this step delivers.
    #[must_use]
    pub fn to_event(self) -> CollectionEvent {
        match self {
            Self::Scroll { offset } => CollectionEvent::Scroll(offset),
            Self::ScrollBy { delta } => CollectionEvent::ScrollBy(delta),
            Self::Resize { width, height } => CollectionEvent::Resize(Size::new(width, height)),
        }
    }

    fn feed<H: Hasher>(&self, hasher: &mut H) {
        match *self {
            Self::Scroll { offset } => (0u8, offset.to_bits()).hash(hasher),
            Self::ScrollBy { delta } => (1u8, delta.to_bits()).hash(hasher),
            Self::Resize { width, height } => (2u8, width.to_bits(), height.to_bits()).hash(hasher),
        }
    }
}

/// Pattern type for storm generation.
#[derive(Debug, Clone, PartialEq)]
pub enum StormPattern {
    /// Rapid absolute scrolls inside the last stretch of content.
    Burst {
        /// Number of scroll events.
        count: usize,
    },
    /// Evenly spaced scrolls from the top to `max_offset`.
    Sweep {
        /// Number of steps.
        steps: usize,
    },
    /// Small relative scrolls in both directions.
    Jitter {
        /// Number of events.
        count: usize,
        /// Largest delta in either direction.
        amplitude: f32,
    },
    /// Negative and huge offsets, zero-size and tiny containers.
    Pathological {
        /// Number of events.
        count: usize,
    },
    /// A recorded or hand-written sequence.
    Custom {
        /// Steps, replayed in order.
        steps: Vec<StormStep>,
    },
}

impl StormPattern {
    /// Get the pattern name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Burst { .. } => "burst",
            Self::Sweep { .. } => "sweep",
            Self::Jitter { .. } => "jitter",
            Self::Pathological { .. } => "pathological",
            Self::Custom { .. } => "custom",
        }
    }

    /// Number of steps this pattern generates.
    pub fn event_count(&self) -> usize {
        match self {
            Self::Burst { count } | Self::Jitter { count, .. } | Self::Pathological { count } => {
                *count
            }
            Self::Sweep { steps } => *steps,
            Self::Custom { steps } => steps.len(),
        }
    }
}

impl Default for StormPattern {
    fn default() -> Self {
        Self::Burst { count: 50 }
    }
}

/// Configuration for storm generation.
#[derive(Debug, Clone)]
pub struct StormConfig {
    /// Random seed for deterministic generation.
    pub seed: u64,
    /// Storm pattern to generate.
    pub pattern: StormPattern,
    /// Container size the pathological pattern restores to.
    pub viewport: Size,
    /// Largest in-range scroll offset of the target view.
    pub max_offset: f32,
    /// How far short of `max_offset` burst scrolls may land.
    pub near_end_band: f32,
    /// Test case name for logging.
    pub case_name: String,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            pattern: StormPattern::default(),
            viewport: Size::new(800.0, 800.0),
            max_offset: 10_000.0,
            near_end_band: 150.0,
            case_name: "default".into(),
        }
    }
}

impl StormConfig {
    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the storm pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: StormPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set the container size.
    #[must_use]
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Size::new(width, height);
        self
    }

    /// Set the largest in-range scroll offset.
    #[must_use]
    pub fn with_max_offset(mut self, max_offset: f32) -> Self {
        self.max_offset = max_offset;
        self
    }

    /// Set the burst band.
    #[must_use]
    pub fn with_near_end_band(mut self, band: f32) -> Self {
        self.near_end_band = band;
        self
    }

    /// Set the test case name.
    #[must_use]
    pub fn with_case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = name.into();
        self
    }
}

// ============================================================================
// Seeded RNG
// ============================================================================

/// Simple LCG PRNG for deterministic generation.
#[derive(Debug, Clone)]
struct SeededRng {
    state: u64,
}

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f32 {
        ((self.next_u64() >> 40) as f32) / ((1u64 << 24) as f32)
    }

    fn next_between(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_unit()
    }
}

// ============================================================================
// Storm Generator
// ============================================================================

/// Deterministic storm: same config, same steps.
#[derive(Debug, Clone)]
pub struct ScrollStorm {
    config: StormConfig,
    steps: Vec<StormStep>,
}

impl ScrollStorm {
    /// Generate the steps for `config`.
    pub fn new(config: StormConfig) -> Self {
        let mut storm = Self {
            config,
            steps: Vec::new(),
        };
        storm.generate_steps();
        storm
    }

    /// Get the generated steps.
    pub fn steps(&self) -> &[StormStep] {
        &self.steps
    }

    /// Get the configuration.
    pub fn config(&self) -> &StormConfig {
        &self.config
    }

    fn generate_steps(&mut self) {
        let mut rng = SeededRng::new(self.config.seed);

        self.steps = match &self.config.pattern {
            StormPattern::Burst { count } => self.generate_burst(&mut rng, *count),
            StormPattern::Sweep { steps } => self.generate_sweep(*steps),
            StormPattern::Jitter { count, amplitude } => {
                Self::generate_jitter(&mut rng, *count, *amplitude)
            }
            StormPattern::Pathological { count } => self.generate_pathological(&mut rng, *count),
            StormPattern::Custom { steps } => steps.clone(),
        };
    }

    fn generate_burst(&self, rng: &mut SeededRng, count: usize) -> Vec<StormStep> {
        let max = self.config.max_offset.max(0.0);
        let low = (max - self.config.near_end_band).max(0.0);
        (0..count)
            .map(|_| StormStep::Scroll {
                offset: rng.next_between(low, max),
            })
            .collect()
    }

    fn generate_sweep(&self, steps: usize) -> Vec<StormStep> {
        let max = self.config.max_offset.max(0.0);
        (0..steps)
            .map(|i| {
                let t = if steps > 1 {
                    i as f32 / (steps - 1) as f32
                } else {
                    1.0
                };
                StormStep::Scroll { offset: max * t }
            })
            .collect()
    }

    fn generate_jitter(rng: &mut SeededRng, count: usize, amplitude: f32) -> Vec<StormStep> {
        let amplitude = amplitude.abs();
        (0..count)
            .map(|_| StormStep::ScrollBy {
                delta: rng.next_between(-amplitude, amplitude),
            })
            .collect()
    }

    fn generate_pathological(&self, rng: &mut SeededRng, count: usize) -> Vec<StormStep> {
        let Size { width, height } = self.config.viewport;
        let max = self.config.max_offset.max(0.0);

        (0..count)
            .map(|i| match i % 8 {
                0 => StormStep::Scroll { offset: -1_000.0 },
                1 => StormStep::Scroll { offset: max * 10.0 + 1.0 },
                2 => StormStep::Resize {
                    width: 0.0,
                    height: 0.0,
                },
                3 => StormStep::Resize { width, height },
                4 => StormStep::ScrollBy { delta: -1.0e9 },
                5 => StormStep::Resize {
                    width: 1.0,
                    height: 1.0,
                },
                6 => StormStep::Resize {
                    width: width * 3.0,
                    height: height / 2.0,
                },
                _ => StormStep::Scroll {
                    offset: rng.next_between(0.0, max),
                },
            })
            .collect()
    }

    /// Compute a deterministic checksum of the step sequence.
    pub fn sequence_checksum(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for step in &self.steps {
            step.feed(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }

    /// Deliver every step to `view`, recording each pass in `log`.
    pub fn replay<T, R>(&self, view: &mut CollectionView<T, R>, log: &mut StormLog) -> StormSummary
    where
        T: Keyed,
        R: ItemRenderer<T>,
    {
        log.push(StormRecord::StormStart {
            case: self.config.case_name.clone(),
            seed: self.config.seed,
            pattern: self.config.pattern.name().to_owned(),
            event_count: self.steps.len(),
            checksum: self.sequence_checksum(),
        });

        let mut summary = StormSummary {
            steps: self.steps.len(),
            ..StormSummary::default()
        };
        let mut hasher = DefaultHasher::new();

        for (idx, step) in self.steps.iter().enumerate() {
            let report = view.handle(step.to_event());
            let first = report.range.map(|r| r.first_index);
            let last = report.range.map(|r| r.last_index);
            (first, last).hash(&mut hasher);

            if let Some(range) = report.range
                && (range.first_index > range.last_index || range.last_index >= view.catalog().len())
            {
                summary.violations += 1;
            }
            if report.load_request.is_some() {
                summary.load_requests += 1;
            }
            summary.max_live = summary.max_live.max(view.recycler_stats().live);

            log.push(StormRecord::StormStep {
                idx,
                step: *step,
                offset: view.viewport().scroll_offset,
                phase: phase_name(report.phase).to_owned(),
                first,
                last,
                rendered: report.reconcile.rendered,
                load_requested: report.load_request.is_some(),
            });
        }

        summary.created = view.recycler_stats().created;
        summary.window_checksum = format!("{:016x}", hasher.finish());

        vista_core::debug!(
            case = %self.config.case_name,
            steps = summary.steps,
            load_requests = summary.load_requests,
            violations = summary.violations,
            "storm replayed"
        );

        log.push(StormRecord::StormComplete {
            steps: summary.steps,
            load_requests: summary.load_requests,
            max_live: summary.max_live,
            created: summary.created,
            violations: summary.violations,
            window_checksum: summary.window_checksum.clone(),
        });
        summary
    }
}

fn phase_name(phase: RenderPhase) -> &'static str {
    match phase {
        RenderPhase::Unmeasured => "unmeasured",
        RenderPhase::Empty => "empty",
        RenderPhase::Items => "items",
    }
}

/// Aggregate result of one replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StormSummary {
    /// Steps delivered.
    pub steps: usize,
    /// Passes that issued a load request.
    pub load_requests: usize,
    /// Most slots live at once.
    pub max_live: usize,
    /// Render nodes created over the view's lifetime.
    pub created: u64,
    /// Passes whose window fell outside the catalog.
    pub violations: usize,
    /// Hash of every window in order. Equal runs produce equal checksums.
    pub window_checksum: String,
}

// ============================================================================
// JSONL Logger
// ============================================================================

/// One JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StormRecord {
    /// Written before the first step.
    StormStart {
        case: String,
        seed: u64,
        pattern: String,
        event_count: usize,
        checksum: String,
    },
    /// Written after each pass.
    StormStep {
        idx: usize,
        step: StormStep,
        offset: f32,
        phase: String,
        first: Option<usize>,
        last: Option<usize>,
        rendered: usize,
        load_requested: bool,
    },
    /// Written after the last step.
    StormComplete {
        steps: usize,
        load_requests: usize,
        max_live: usize,
        created: u64,
        violations: usize,
        window_checksum: String,
    },
}

/// JSONL log of storm replays.
#[derive(Debug, Clone, Default)]
pub struct StormLog {
    records: Vec<StormRecord>,
}

impl StormLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: StormRecord) {
        self.records.push(record);
    }

    /// All records so far.
    pub fn records(&self) -> &[StormRecord] {
        &self.records
    }

    /// Steps recorded so far, ready to feed back as [`StormPattern::Custom`].
    pub fn recorded_steps(&self) -> Vec<StormStep> {
        self.records
            .iter()
            .filter_map(|record| match record {
                StormRecord::StormStep { step, .. } => Some(*step),
                _ => None,
            })
            .collect()
    }

    /// Get all log lines as JSONL.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let lines = self
            .records
            .iter()
            .map(serde_json::to_string)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(lines.join("\n"))
    }

    /// Write every record, one per line.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for record in &self.records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Parse a log written by [`StormLog::to_jsonl`] or [`StormLog::write_to`].
    /// Blank lines are skipped.
    pub fn parse_jsonl(input: &str) -> serde_json::Result<Self> {
        let records = input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self { records })
    }
}
