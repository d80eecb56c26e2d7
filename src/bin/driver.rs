use std::time::Instant;

use cuckoo_map::workload::{run_workload, WorkloadConfig};

fn main() {
    env_logger::init();

    let config = WorkloadConfig::default();
    let start = Instant::now();
    let stats = run_workload(config);
    let elapsed = start.elapsed();

    println!(
        "{} ops in {:.2?} ({} inserts, {} lookups/{} hits, {} removes/{} hits)",
        config.operations,
        elapsed,
        stats.inserts,
        stats.lookups,
        stats.lookup_hits,
        stats.removes,
        stats.remove_hits,
    );
}
