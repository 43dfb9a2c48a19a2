use prefsync_cli::{run_simulator, SimulatorConfig, Violation};

fn config() -> SimulatorConfig {
    SimulatorConfig {
        users: 3,
        edits_per_user: 15,
        settle_ms: 40,
        ..SimulatorConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_clean_run_passes_and_coalesces() {
    prefsync_test_utils::init_test_tracing();
    let report = run_simulator(config()).await;

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.users.len(), 3);
    assert!(report.total_writes() <= report.total_edits());
    for user in &report.users {
        assert!(user.writes <= user.bursts);
        assert_eq!(user.accepted, user.writes);
        assert_eq!(user.fetches, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_injected_failures_still_converge() {
    let report = run_simulator(SimulatorConfig {
        fail_every: Some(2),
        ..config()
    })
    .await;

    assert!(
        !report
            .violations
            .iter()
            .any(|v| matches!(v, Violation::Diverged { .. })),
        "{}",
        report.generate_text()
    );
    for user in &report.users {
        // one recovery fetch per failed write, plus the initial load
        assert_eq!(user.fetches, 1 + (user.writes - user.accepted));
    }
}

#[tokio::test(start_paused = true)]
async fn test_report_serializes_for_json_output() {
    let report = run_simulator(SimulatorConfig {
        users: 1,
        edits_per_user: 3,
        ..config()
    })
    .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["config"]["users"], 1);
    assert!(json["violations"].as_array().unwrap().is_empty());
    assert!(report.generate_text().contains("=== Result: PASS ==="));
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_gives_same_write_pattern() {
    let first = run_simulator(config()).await;
    let second = run_simulator(config()).await;

    let writes = |r: &prefsync_cli::SimulatorReport| {
        r.users.iter().map(|u| (u.bursts, u.writes)).collect::<Vec<_>>()
    };
    assert_eq!(writes(&first), writes(&second));
    for user in &first.users {
        assert_eq!(user.writes, user.bursts);
    }
}
