use procsim::{
    run, run_workload, PoissonWorkload, ProcessId, ScriptedArrival, ScriptedWorkload, SimConfig,
    SimError, Simulation,
};
use proptest::prelude::*;

fn init_logger() {
    let _ = pretty_env_logger::formatted_builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

fn scripted(arrivals: &[(f64, u64, u64)]) -> ScriptedWorkload {
    ScriptedWorkload::new(
        arrivals
            .iter()
            .map(|&(at, ram, instructions)| ScriptedArrival { at, ram, instructions })
            .collect(),
    )
    .unwrap()
}

fn config(ram_capacity: u64, cpu_speed: f64) -> SimConfig {
    SimConfig {
        ram_capacity,
        cpu_speed,
        ..SimConfig::default()
    }
}

#[test]
fn test_single_process_two_slices() {
    init_logger();
    let result = run_workload(&config(100, 3.0), scripted(&[(0.0, 10, 6)])).unwrap();

    assert_eq!(result.waiting_times, vec![2.0]);
    let rec = &result.records[0];
    assert_eq!(rec.ram_granted_at, 0.0);
    assert_eq!(rec.slices, 2);
    assert_eq!(result.ram_utilization_series, vec![10.0]);
}

#[test]
fn test_second_process_queues_for_cpu() {
    init_logger();
    let result = run_workload(&config(100, 3.0), scripted(&[(0.0, 1, 3), (0.0, 1, 3)])).unwrap();

    assert_eq!(result.waiting_times, vec![1.0, 2.0]);
    assert_eq!(result.peak_executing, 1);
}

#[test]
fn test_blocked_ram_granted_on_release() {
    init_logger();
    // A takes all 5 units and runs 4 instructions at speed 1, finishing at 4
    let cfg = config(5, 1.0);
    let result = run_workload(&cfg, scripted(&[(0.0, 5, 4), (1.0, 3, 1)])).unwrap();

    let b = result.records.iter().find(|r| r.id == ProcessId(1)).unwrap();
    assert_eq!(b.arrival_time, 1.0);
    assert_eq!(b.ram_granted_at, 4.0);
    assert_eq!(b.end_time, 5.0);
    assert_eq!(result.waiting_times, vec![4.0, 4.0]);
    // sampled while each finisher still held its memory
    assert_eq!(result.ram_utilization_series, vec![5.0, 3.0]);
}

#[test]
fn test_zero_processes_reports_no_data() {
    init_logger();
    let config = SimConfig {
        process_count: 0,
        ..SimConfig::default()
    };
    let result = run(&config).unwrap();

    assert!(result.waiting_times.is_empty());
    assert!(result.mean().is_none());
    assert!(result.stddev().is_none());
    assert_eq!(result.summary().unwrap_err(), SimError::EmptyResultSet);
}

#[test]
fn test_unsatisfiable_request_is_flagged() {
    init_logger();
    let err = run_workload(&config(8, 1.0), scripted(&[(0.0, 9, 1)])).unwrap_err();
    assert_eq!(
        err,
        SimError::InvalidDemand {
            process: ProcessId(0),
            requested: 9,
            capacity: 8
        }
    );
}

#[test]
fn test_horizon_matches_fixed_cutoff() {
    init_logger();
    let config = SimConfig {
        process_count: 500,
        mean_arrival_interval: 1.0,
        horizon: Some(100.0),
        ..SimConfig::default()
    };
    let result = run(&config).unwrap();

    assert!(result.final_time <= 100.0);
    assert!(result.records.iter().all(|r| r.end_time <= 100.0));
    assert!(result.unfinished > 0);
}

fn arb_config() -> impl Strategy<Value = SimConfig> {
    (0u64..60, 10u64..200, 1u32..8, 1u64..4, 0.1f64..20.0, any::<u64>()).prop_map(
        |(process_count, ram_capacity, speed, cpu_slots, mean_arrival_interval, random_seed)| {
            SimConfig {
                process_count,
                ram_capacity,
                cpu_speed: f64::from(speed),
                cpu_slots,
                mean_arrival_interval,
                horizon: None,
                random_seed,
            }
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_process_completes(config in arb_config()) {
        let result = run(&config).unwrap();

        prop_assert_eq!(result.completed() as u64, config.process_count);
        prop_assert_eq!(result.unfinished, 0);
        prop_assert!(result.peak_executing as u64 <= config.cpu_slots);
        prop_assert!(result.peak_ram_in_use <= config.ram_capacity);
        prop_assert_eq!(result.ram_occupancy.peak(), Some(result.peak_ram_in_use));
        if let Ok(summary) = result.summary() {
            let util = summary.ram_utilization.unwrap_or(0.0);
            prop_assert!((0.0..=1.0).contains(&util), "utilization {}", util);
        }

        for (rec, &waiting) in result.records.iter().zip(&result.waiting_times) {
            prop_assert!(rec.end_time >= rec.arrival_time);
            prop_assert!(rec.ram_granted_at >= rec.arrival_time);
            prop_assert!(waiting >= 0.0);
        }
    }

    #[test]
    fn prop_same_seed_same_run(config in arb_config()) {
        let a = run(&config).unwrap();
        let b = run(&config).unwrap();
        prop_assert_eq!(a.waiting_times, b.waiting_times);
        prop_assert_eq!(a.records, b.records);
    }

    #[test]
    fn prop_ram_granted_in_request_order(config in arb_config()) {
        // requests are issued at arrival, so grants follow process ids
        let result = run(&config).unwrap();
        let mut records = result.records.clone();
        records.sort_by_key(|r| r.id);
        for pair in records.windows(2) {
            prop_assert!(pair[0].ram_granted_at <= pair[1].ram_granted_at);
        }
    }

    #[test]
    fn prop_ram_conserved_at_every_event(config in arb_config()) {
        let workload = PoissonWorkload::seeded(
            config.process_count,
            config.mean_arrival_interval,
            config.random_seed,
        ).unwrap();
        let mut sim = Simulation::new(&config, workload).unwrap();

        while sim.step().unwrap() {
            let held: u64 = sim.processes().iter().map(|p| p.ram_held()).sum();
            prop_assert_eq!(sim.ram().level() + held, config.ram_capacity);
            prop_assert!(sim.executing() as u64 <= config.cpu_slots);
        }
        prop_assert_eq!(sim.live(), 0);
    }
}
