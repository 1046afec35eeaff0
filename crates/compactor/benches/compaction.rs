use compactor_core::{
    CompactConfig, CompactManager, Message, MessagePartitioner, NullExporter, TokenEstimator,
};
use compactor_summarize::ExtractiveSummarizer;
use compactor_telemetry::HeuristicEstimator;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn session(turns: usize) -> Vec<Message> {
    let mut msgs = vec![Message::system("You are a careful coding assistant.")];
    for i in 0..turns {
        msgs.push(Message::user(format!(
            "Step {i}: update the parser and run the tests again."
        )));
        msgs.push(Message::assistant(format!(
            "Step {i} done. Two tests still fail in the lexer module."
        )));
        if i % 3 == 0 {
            msgs.push(Message::tool(format!("{{\"passed\": {}, \"failed\": 2}}", 40 + i)));
        }
    }
    msgs
}

fn bench_partition_200_turns(c: &mut Criterion) {
    let partitioner = MessagePartitioner::new(CompactConfig::default().policy().clone());
    let msgs = session(200);

    c.bench_function("partition_200_turns", |b| {
        b.iter(|| partitioner.partition(black_box(&msgs)));
    });
}

fn bench_estimate_200_turns(c: &mut Criterion) {
    let msgs = session(200);

    c.bench_function("estimate_200_turns", |b| {
        b.iter(|| HeuristicEstimator.estimate_messages_tokens(black_box(&msgs)));
    });
}

fn bench_manual_compact_200_turns(c: &mut Criterion) {
    let mut manager = CompactManager::new(
        CompactConfig::default(),
        Box::new(HeuristicEstimator),
        Box::new(ExtractiveSummarizer::default()),
        Box::new(NullExporter),
    );
    let msgs = session(200);

    c.bench_function("manual_compact_200_turns", |b| {
        b.iter(|| manager.manual_compact("bench", black_box(&msgs), "bench"));
    });
}

criterion_group!(
    benches,
    bench_partition_200_turns,
    bench_estimate_200_turns,
    bench_manual_compact_200_turns
);
criterion_main!(benches);
