use std::{fs, num::NonZeroU32, path::Path};

use fedavg::{
    FedAvgError,
    aggregation::Metrics,
    configs::BaseConfig,
    records::{Phase, RecordWriter, RoundRecord},
    report::CSV_HEADER,
    sweep::{CommandRunner, SearchSpace, Sweep, TrialParams, TrialRunner},
};

const CONFIG: &str = r#"{
    "num-server-rounds": 3,
    "fraction-fit": 0.5,
    "local-epochs": 1,
    "batch-size": 32,
    "learning-rate": 0.01,
    "num-clients": 20,
    "min-available-clients": 10
}"#;

fn base() -> BaseConfig {
    BaseConfig::from_json_str(CONFIG).unwrap()
}

/// Writes a fixed three round run to the trial log and hands it back.
struct ScriptedRunner {
    calls: Vec<TrialParams>,
}

impl TrialRunner for ScriptedRunner {
    fn run_trial(
        &mut self,
        _trial: usize,
        params: &TrialParams,
        log_path: &Path,
    ) -> fedavg::Result<Vec<RoundRecord>> {
        self.calls.push(*params);

        let records: Vec<_> = [(1.2, 0.40), (0.8, 0.65), (0.9, 0.61)]
            .into_iter()
            .zip(1..)
            .map(|((loss, acc), round)| {
                RoundRecord::new(
                    NonZeroU32::new(round).unwrap(),
                    Phase::Evaluate,
                    Some(loss),
                    Metrics::from([("accuracy".to_string(), acc)]),
                )
            })
            .collect();

        let mut writer = RecordWriter::new(fs::File::create(log_path)?);
        writer.write_all(&records)?;
        Ok(records)
    }
}

#[test]
fn sweep_writes_one_row_per_trial() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner { calls: Vec::new() };
    let mut sweep = Sweep::new(runner, SearchSpace::default(), base(), dir.path(), Some(42));

    let results = sweep.run(3).unwrap();
    assert_eq!(results.len(), 3);

    for result in &results {
        assert_eq!(result.summary.best_loss, 0.8);
        assert_eq!(result.summary.best_loss_round, 2);
        assert_eq!(result.summary.final_acc, 0.61);
        assert!(result.log_path.exists());
        assert!(result.log_path.starts_with(dir.path().join(result.params.dir_name())));
    }

    let csv = fs::read_to_string(sweep.summary_path()).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], CSV_HEADER);

    let p = results[0].params;
    assert_eq!(
        lines[1],
        format!(
            "20,3,{},{},{},{},0.8,0.9,0.65,0.61",
            p.fraction_fit, p.local_epochs, p.batch_size, p.learning_rate
        )
    );
}

#[test]
fn seeded_sweeps_sample_the_same_trials() {
    let sample = |seed| {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner { calls: Vec::new() };
        let mut sweep = Sweep::new(runner, SearchSpace::default(), base(), dir.path(), Some(seed));
        sweep.run(4).unwrap().into_iter().map(|r| r.params).collect::<Vec<_>>()
    };

    assert_eq!(sample(9), sample(9));
}

#[cfg(unix)]
#[test]
fn command_runner_reads_records_from_the_command_output() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("simulation_log.txt");

    let script = "echo 'INFO starting'; \
                  echo 'v=1 round=1 phase=evaluate loss=0.5 metric.accuracy=0.7'; \
                  echo \"got $0\"";
    let mut runner = CommandRunner::new("sh", vec!["-c".into(), script.into()]);
    let params = TrialParams::new(0.3, 5, 0.004, 20);

    let records = runner.run_trial(0, &params, &log_path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metrics["accuracy"], 0.7);

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains(
        "got --run-config=fraction-fit=0.3 local-epochs=5 learning-rate=0.004 batch-size=20"
    ));
}

#[cfg(unix)]
#[test]
fn failing_command_fails_the_trial() {
    let dir = tempfile::tempdir().unwrap();
    let command = vec!["sh".into(), "-c".into(), "exit 3".into()];
    let mut runner = CommandRunner::from_command_line(command).unwrap();
    let params = TrialParams::new(0.1, 1, 0.01, 10);

    match runner.run_trial(4, &params, &dir.path().join("log.txt")) {
        Err(FedAvgError::TrialFailed { trial, status }) => {
            assert_eq!(trial, 4);
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn empty_command_line_is_rejected() {
    assert!(CommandRunner::from_command_line(Vec::new()).is_err());
}
