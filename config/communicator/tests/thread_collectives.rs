use std::sync::atomic::{AtomicUsize, Ordering};

use communicator::{
    root_println, spawn_world, CommError, Communicator, ReduceOp, ThreadCommunicator,
};

#[test]
fn test_spawn_world_results_in_rank_order() {
    let ranks = spawn_world(4, |comm| (comm.world_rank(), comm.world_size())).unwrap();
    assert_eq!(ranks, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
}

#[test]
fn test_all_gather_u64() {
    const WORLD_SIZE: usize = 5;

    let gathered = spawn_world(WORLD_SIZE, |comm| {
        comm.all_gather_u64(10 * comm.world_rank() as u64 + 1)
    })
    .unwrap();

    let expected: Vec<u64> = (0..WORLD_SIZE as u64).map(|r| 10 * r + 1).collect();
    gathered.iter().for_each(|g| assert_eq!(*g, expected));
}

#[test]
fn test_all_reduce_identical_everywhere() {
    let results = spawn_world(6, |comm| {
        let x = 0.1 * (comm.world_rank() as f64 + 1.0);
        (
            comm.all_reduce_f64(x, ReduceOp::Sum),
            comm.all_reduce_f64(x, ReduceOp::Max),
            comm.all_reduce_f64(x, ReduceOp::Min),
        )
    })
    .unwrap();

    let (sum, max, min) = results[0];
    assert!((sum - 2.1).abs() < 1e-12);
    assert!((max - 0.6).abs() < 1e-12);
    assert!((min - 0.1).abs() < 1e-12);
    // bit-identical, not merely close
    results.iter().for_each(|r| assert_eq!(*r, results[0]));
}

#[test]
fn test_exclusive_scan() {
    let offsets = spawn_world(4, |comm| {
        comm.exclusive_scan_sum_u64(comm.world_rank() as u64 + 1)
    })
    .unwrap();
    assert_eq!(offsets, vec![0, 1, 3, 6]);
}

#[test]
fn test_repeated_collectives_do_not_mix_rounds() {
    let rounds = spawn_world(3, |comm| {
        (0..50u64)
            .map(|round| comm.all_gather_u64(round * 100 + comm.world_rank() as u64))
            .collect::<Vec<_>>()
    })
    .unwrap();

    for per_rank in &rounds {
        for (round, gathered) in per_rank.iter().enumerate() {
            let round = round as u64;
            assert_eq!(*gathered, vec![round * 100, round * 100 + 1, round * 100 + 2]);
        }
    }
}

#[test]
fn test_root_println_only_runs_on_root() {
    let printed = AtomicUsize::new(0);
    spawn_world(3, |comm| {
        // the format arguments are only evaluated by the participant that prints
        root_println!(
            comm,
            "hello from rank {} ({} printed)",
            comm.world_rank(),
            printed.fetch_add(1, Ordering::SeqCst) + 1
        );
        comm.barrier();
    })
    .unwrap();
    assert_eq!(printed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_participant_aborts_the_group() {
    let result = spawn_world(2, |comm| {
        if comm.world_rank() == 1 {
            panic!("participant 1 gives up");
        }
        comm.barrier();
    });
    assert!(matches!(result, Err(CommError::GroupAborted { rank: 1 })));
}

#[test]
fn test_early_return_aborts_blocked_collectives() {
    let result = spawn_world(3, |comm| {
        if comm.world_rank() == 2 {
            return 0;
        }
        comm.all_gather_u64(1).len()
    });
    assert!(matches!(result, Err(CommError::GroupAborted { rank: 2 })));
}

#[test]
fn test_panic_after_last_collective_still_reported() {
    let result = spawn_world(3, |comm| {
        let total = comm.all_reduce_f64(1.0, ReduceOp::Sum);
        assert!(comm.world_rank() != 0, "rank 0 fails after the reduction");
        total
    });
    assert!(matches!(result, Err(CommError::GroupAborted { rank: 0 })));
}

#[test]
fn test_world_handles_share_a_group() {
    let comms = ThreadCommunicator::world(3).unwrap();
    assert_eq!(comms.len(), 3);
    assert!(comms[0].is_root());
    assert_ne!(comms[0], comms[1]);
}
