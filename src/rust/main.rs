use std::io;
use std::path::PathBuf;
use std::time::Instant;
use anyhow::Context;
use clap::Parser;
use log::info;

use hate_detector::{
    repl::{self, OutputFormat}, BuiltinTokenizer, Controller, DetectorConfig, ExplainerConfig, ModelManager,
    OptimizationLevel, RuntimeConfig, TokenizerSource,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the fine-tuned model.onnx and config.json
    #[arg(short, long, default_value = "final_fine_tuned_bert")]
    model_dir: PathBuf,

    /// Use this tokenizer.json instead of fetching bert-base-uncased
    #[arg(short, long)]
    tokenizer: Option<PathBuf>,

    /// Force a fresh download of the tokenizer files
    #[arg(short, long)]
    fresh: bool,

    /// Tokens the model sees; longer input is truncated
    #[arg(long, default_value_t = 180)]
    max_length: usize,

    /// Words shown in each explanation
    #[arg(long, default_value_t = 6)]
    num_features: usize,

    /// Perturbed texts scored per explanation
    #[arg(long, default_value_t = 100)]
    num_samples: usize,

    /// Texts per forward pass while explaining
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Seed for repeatable explanations
    #[arg(long)]
    seed: Option<u64>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// Graph optimization level: disabled, basic, extended or all
    #[arg(long, default_value_t = OptimizationLevel::All)]
    optimization: OptimizationLevel,

    /// Print one JSON object per input line instead of the interactive view
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> DetectorConfig {
        DetectorConfig {
            model_dir: self.model_dir,
            tokenizer: match self.tokenizer {
                Some(path) => TokenizerSource::File(path),
                None => TokenizerSource::Builtin(BuiltinTokenizer::BertBaseUncased),
            },
            max_length: self.max_length,
            batch_size: self.batch_size,
            explainer: ExplainerConfig {
                num_features: self.num_features,
                num_samples: self.num_samples,
                ..Default::default()
            },
            seed: self.seed,
            runtime: RuntimeConfig::default()
                .with_intra_threads(self.intra_threads)
                .with_optimization_level(self.optimization),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hate_detector::init_logger();
    let args = Args::parse();
    let fresh = args.fresh;
    let format = if args.json { OutputFormat::Json } else { OutputFormat::Text };
    let config = args.into_config();

    info!("=== Starting Hate Speech Detector ===");
    let start_time = Instant::now();

    let manager = ModelManager::new_default().context("Failed to create tokenizer cache")?;
    let tokenizer_path = config.resolve_tokenizer(&manager, fresh).await
        .context("Failed to fetch tokenizer")?;

    let classifier = config.load_classifier(&tokenizer_path)
        .with_context(|| format!("Failed to load model from {}", config.model_dir.display()))?;
    let info = classifier.info();
    info!("Model: {} ({} labels: {:?})", info.model_path, info.num_labels, info.labels);
    info!("=== Detector Ready (took {:.2?}) ===", start_time.elapsed());

    let explainer = config.explainer()?;
    let mut controller = Controller::new(&classifier, explainer, config.rng());

    let stdin = io::stdin();
    repl::run_with_format(&mut controller, stdin.lock(), io::stdout(), format)?;
    Ok(())
}
