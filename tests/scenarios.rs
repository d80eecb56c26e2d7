use cuckoo_map::{CuckooConfig, CuckooMap, Key};

#[test]
fn lookup_on_empty_map_misses() {
    let map: CuckooMap<Key, u64> = CuckooMap::new(16);
    let finding = map.lookup(&Key(1));
    assert!(!finding.found());
    assert_eq!(finding.value(), None);
}

#[test]
fn insert_lookup_remove_round_trips() {
    let map: CuckooMap<Key, u64> = CuckooMap::new(16);
    assert!(map.insert(Key(7), 700).unwrap());
    assert_eq!(map.nr_used(), 1);

    let finding = map.lookup(&Key(7));
    assert!(finding.found());
    assert_eq!(finding.value(), Some(&700));
    drop(finding);

    assert!(map.remove(&Key(7)));
    assert_eq!(map.nr_used(), 0);
    assert!(!map.lookup(&Key(7)).found());
}

#[test]
fn duplicate_insert_is_rejected_and_leaves_value_unchanged() {
    let map: CuckooMap<Key, u64> = CuckooMap::new(16);
    assert!(map.insert(Key(3), 1).unwrap());
    assert!(!map.insert(Key(3), 2).unwrap());
    assert_eq!(map.lookup(&Key(3)).value(), Some(&1));
}

#[test]
fn removing_an_absent_key_reports_false() {
    let map: CuckooMap<Key, u64> = CuckooMap::new(16);
    assert!(!map.remove(&Key(99)));
}

#[test]
fn forced_overflow_grows_the_cascade_and_keeps_all_keys_reachable() {
    let config = CuckooConfig {
        kick_budget: 8,
        growth_factor: 4,
    };
    let map: CuckooMap<Key, u64> = CuckooMap::with_config(4, config);

    let mut inserted = Vec::new();
    for i in 1..=200u64 {
        map.insert(Key(i), i * 10).unwrap();
        inserted.push(i);
    }

    assert!(map.layer_count() > 1, "expected the cascade to have grown past layer 0");
    for i in inserted {
        let finding = map.lookup(&Key(i));
        assert!(finding.found(), "key {i} went missing");
        assert_eq!(finding.value(), Some(&(i * 10)));
    }
}

#[test]
fn insert_finding_points_at_the_just_inserted_pair_under_heavy_eviction() {
    let config = CuckooConfig {
        kick_budget: 8,
        growth_factor: 4,
    };
    let map: CuckooMap<Key, u64> = CuckooMap::with_config(4, config);

    // Drive the cascade into overflow first, so later inserts force long
    // eviction chains through already-crowded layers.
    for i in 1..=200u64 {
        map.insert(Key(i), i * 10).unwrap();
    }
    assert!(map.layer_count() > 1, "expected the cascade to have grown past layer 0");

    for i in 201..=260u64 {
        let (inserted, finding) = map.insert_finding(Key(i), i * 10).unwrap();
        assert!(inserted, "key {i} should have been newly inserted");
        assert_eq!(finding.key(), Some(&Key(i)), "finding pointed at the wrong key for {i}");
        assert_eq!(finding.value(), Some(&(i * 10)), "finding pointed at the wrong value for {i}");
        drop(finding);

        // An independent lookup must agree with what the finding reported.
        let relookup = map.lookup(&Key(i));
        assert_eq!(relookup.value(), Some(&(i * 10)), "key {i} unreachable via a fresh lookup");
    }
}

#[test]
fn lookup_promotes_a_key_out_of_a_nearly_empty_deeper_layer() {
    let config = CuckooConfig::default();
    let map: CuckooMap<Key, u64> = CuckooMap::with_seed(2, config, 12345);

    // A small layer 0 (16 slots) overflows well before 60 keys are in.
    for i in 1..=60u64 {
        map.insert(Key(i), i).unwrap();
    }
    assert!(map.layer_count() > 1, "expected layer 0 to have overflowed by now");

    let deep_key = (1..=60u64)
        .find(|i| map.layer_of(&Key(*i)) == Some(1))
        .expect("expected at least one key to have spilled into layer 1");

    // Free up room in layer 0 so the promotion re-insert has somewhere to
    // land, then promote by looking the key up.
    for i in 1..=60u64 {
        if Key(i) != Key(deep_key) && map.layer_of(&Key(i)) == Some(0) {
            map.remove(&Key(i));
        }
    }

    assert_eq!(map.lookup(&Key(deep_key)).value(), Some(&deep_key));
    assert_eq!(
        map.layer_of(&Key(deep_key)),
        Some(0),
        "lookup should have promoted the key to layer 0 now that it has room"
    );
}

#[test]
fn mixed_workload_matches_a_reference_map() {
    use cuckoo_map::workload::{run_workload, WorkloadConfig};

    let stats = run_workload(WorkloadConfig {
        operations: 5_000,
        initial_keys: 200,
        key_space: 800,
        seed: 99,
        ..WorkloadConfig::default()
    });
    assert_eq!(stats.inserts + stats.lookups + stats.removes, 5_000);
}
