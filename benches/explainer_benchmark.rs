use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hate_detector::{ClassifierError, Encoder, ExplainerConfig, FeatureSelection, ProbabilityDistribution, TextExplainer};
use rand::{rngs::StdRng, SeedableRng};

const TOKENIZER_JSON: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": {"type": "Lowercase"},
    "pre_tokenizer": {"type": "Whitespace"},
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {"[PAD]": 0, "[UNK]": 1, "i": 2, "love": 3, "this": 4, "community": 5, "hate": 6, "you": 7},
        "unk_token": "[UNK]"
    }
}"#;

const SHORT_TEXT: &str = "I love this community";
const MEDIUM_TEXT: &str = "I really hate waiting in traffic every single morning, but the people \
    in this community are kind and the coffee shop on the corner makes my day";

// Cheap stand-in for the model so the numbers reflect the explainer itself
fn keyword_scores(texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
    Ok(texts.iter()
        .map(|text| {
            let hate = text.matches("hate").count() as f32;
            let love = text.matches("love").count() as f32 + text.matches("kind").count() as f32;
            let raw = [0.1 + hate, 0.1 + love, 0.1];
            let sum: f32 = raw.iter().sum();
            ProbabilityDistribution::new(raw.iter().map(|v| v / sum).collect())
        })
        .collect())
}

fn bench_tokenization(c: &mut Criterion) {
    let encoder = Encoder::from_json(TOKENIZER_JSON, 180).unwrap();
    let mut group = c.benchmark_group("Tokenization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let batch: Vec<&str> = std::iter::repeat(MEDIUM_TEXT).take(32).collect();
    group.bench_function("encode_batch_32", |b| b.iter(|| {
        encoder.encode_batch(black_box(&batch)).unwrap()
    }));

    let long_text = vec![MEDIUM_TEXT; 20].join(" ");
    group.bench_function("truncate_long_text", |b| b.iter(|| {
        encoder.encode_batch(black_box(&[long_text.as_str()])).unwrap()
    }));

    group.finish();
}

fn bench_explanation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Explanation");
    group.sample_size(30);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let configs = [
        ("forward_selection", FeatureSelection::ForwardSelection),
        ("highest_weights", FeatureSelection::HighestWeights),
        ("all_words", FeatureSelection::All),
    ];
    for (name, selection) in configs {
        let explainer = TextExplainer::new(ExplainerConfig {
            feature_selection: selection,
            ..Default::default()
        }).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        group.bench_function(format!("short_{}", name), |b| b.iter(|| {
            explainer.explain(black_box(SHORT_TEXT), keyword_scores, 1, &mut rng).unwrap()
        }));
        group.bench_function(format!("medium_{}", name), |b| b.iter(|| {
            explainer.explain(black_box(MEDIUM_TEXT), keyword_scores, 1, &mut rng).unwrap()
        }));
    }

    group.finish();
}

fn bench_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("Samples");
    group.sample_size(20);

    for &num_samples in &[50, 100, 500, 1000] {
        let explainer = TextExplainer::new(ExplainerConfig {
            num_samples,
            ..Default::default()
        }).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        group.bench_function(format!("samples_{}", num_samples), |b| b.iter(|| {
            explainer.explain(black_box(MEDIUM_TEXT), keyword_scores, 1, &mut rng).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenization,
    bench_explanation,
    bench_samples
);
criterion_main!(benches);
