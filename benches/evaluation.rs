use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use propel_core::{
    eval::{evaluate_flag, EvaluationContext},
    flag::FlagScope,
    sharder::{Md5Sharder, Sharder},
    FlagSnapshot,
};

fn criterion_benchmark(c: &mut Criterion) {
    let snapshot = FlagSnapshot::from_path("tests/data/flags.json").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 15, 0, 0).unwrap();

    {
        let mut group = c.benchmark_group("sharder");
        group.throughput(Throughput::Elements(1));
        group.bench_function("get_shard", |b| {
            b.iter(|| Md5Sharder.get_shard(black_box(&["user-1", "new-checkout"]), 100))
        });
        group.finish();
    }

    let cases = [
        ("dark-mode", EvaluationContext::new(now).with_user_id("alice")),
        ("new-checkout", EvaluationContext::new(now).with_user_id("alice")),
        ("tenant-beta", EvaluationContext::new(now).with_tenant_id("acme")),
        ("checkout-theme", EvaluationContext::new(now).with_user_id("bob")),
        (
            "business-hours",
            EvaluationContext::new(now).with_time_zone("Asia/Tokyo"),
        ),
        (
            "premium-banner",
            EvaluationContext::new(now)
                .with_attribute("plan", "free")
                .with_attribute("age", 70.0),
        ),
    ];

    for (flag_key, context) in &cases {
        let flag = snapshot
            .get_flag(FlagScope::Global, flag_key)
            .unwrap()
            .unwrap();

        let mut group = c.benchmark_group(*flag_key);
        group.throughput(Throughput::Elements(1));
        group.bench_function("evaluate_flag", |b| {
            b.iter(|| evaluate_flag(black_box(flag), black_box(context)))
        });
        group.finish();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
