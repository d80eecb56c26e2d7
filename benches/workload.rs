use criterion::{criterion_group, criterion_main, Criterion};
use cuckoo_map::workload::{run_workload, WorkloadConfig};

fn workload_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("workload_mix");
    for &operations in &[1_000usize, 10_000] {
        group.bench_function(format!("{operations}_ops"), |b| {
            b.iter(|| {
                run_workload(WorkloadConfig {
                    operations,
                    ..WorkloadConfig::default()
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, workload_mix);
criterion_main!(benches);
