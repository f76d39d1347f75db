use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// How much graph rewriting ONNX Runtime does before the first forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    Disabled,
    Basic,
    Extended,
    /// Every rewrite, including layout changes; slowest to load
    #[default]
    All,
}

impl OptimizationLevel {
    pub const NAMES: [&'static str; 4] = ["disabled", "basic", "extended", "all"];

    pub fn name(&self) -> &'static str {
        match self {
            OptimizationLevel::Disabled => "disabled",
            OptimizationLevel::Basic => "basic",
            OptimizationLevel::Extended => "extended",
            OptimizationLevel::All => "all",
        }
    }

    fn to_ort(self) -> GraphOptimizationLevel {
        match self {
            OptimizationLevel::Disabled => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "0" => Ok(OptimizationLevel::Disabled),
            "basic" | "1" => Ok(OptimizationLevel::Basic),
            "extended" | "2" => Ok(OptimizationLevel::Extended),
            "all" | "3" => Ok(OptimizationLevel::All),
            other => Err(format!(
                "unknown optimization level '{}', expected one of {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// ONNX Runtime settings for the detection model session.
///
/// Zero thread counts leave the choice to ONNX Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

impl RuntimeConfig {
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }

    pub fn with_optimization_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }
}

/// Initializes the ONNX Runtime environment once per process.
///
/// A failed first attempt is remembered and reported on every later call.
pub fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| {
        ort::init()
            .with_name("hate-detector")
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
    .clone()
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    if let Err(e) = ensure_initialized() {
        log::warn!("ONNX Runtime environment initialization failed, using defaults: {}", e);
    }
    log::debug!(
        "Session: {} inter / {} intra threads, optimization {}",
        config.inter_threads, config.intra_threads, config.optimization_level
    );

    let mut builder = Session::builder()?;
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    builder.with_optimization_level(config.optimization_level.to_ort())
}
