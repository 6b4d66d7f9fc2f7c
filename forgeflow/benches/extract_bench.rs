//! Benchmarks for response extraction and prompt composition.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forgeflow::context::StageInput;
use forgeflow::core::{Skill, Slot};
use forgeflow::prompts::compose;
use forgeflow::stages::extract;

fn sample_code(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("    value_{i} = compute({i})  # step {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_benchmark(c: &mut Criterion) {
    let code = sample_code(500);
    let fenced = format!("```python\n{code}\n```");

    c.bench_function("extract_fenced", |b| b.iter(|| extract(black_box(&fenced))));
    c.bench_function("extract_unfenced", |b| b.iter(|| extract(black_box(&code))));
}

fn compose_benchmark(c: &mut Criterion) {
    let input = StageInput::new()
        .with(Slot::OriginalPrompt, "build a counter button")
        .with(Slot::Code, sample_code(500))
        .with(Slot::DebugPlan, "1. check the handler");

    c.bench_function("compose_debug", |b| {
        b.iter(|| compose(Skill::Debug, black_box(&input)))
    });
}

criterion_group!(benches, extract_benchmark, compose_benchmark);
criterion_main!(benches);
