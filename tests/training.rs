mod common;

use adversarial_training::{
    TrainErr,
    metrics::MemorySink,
    training::{PassCounters, TrainerBuilder},
};
use serde_json::json;

use common::{config, loader};

#[test]
fn normal_mode_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), json!({}));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    let (mut train, mut dev, mut test) = (loader(10, 5), loader(6, 5), loader(6, 5));
    let state = trainer.train(&mut train, &mut dev).unwrap();

    assert_eq!(state.total_batch, (10 / 5) * 2);
    assert!(state.best_loss.is_finite());
    assert!(state.best_loss >= 0.);

    let dev_loss = trainer.sink().series("loss/dev");
    assert_eq!(dev_loss.len(), 1);
    assert_eq!(dev_loss[0].0, 0);
    assert!(dev_loss[0].1.is_finite() && dev_loss[0].1 >= 0.);
    for series in ["loss/train", "acc/train", "acc/dev"] {
        assert_eq!(trainer.sink().series(series).len(), 1);
    }

    assert_eq!(
        trainer.counters(),
        PassCounters {
            forwards: 4,
            backwards: 4,
            adv_steps: 0,
            restores: 0,
            optimizer_steps: 4,
        }
    );

    let evaluation = trainer.test(&mut test).unwrap();
    let report = evaluation.report.unwrap();
    assert_eq!(report.confusion().total(), 6);
    assert_eq!(report.names(), ["neg", "pos"]);
    assert!(config.save_path.exists());
}

#[test]
fn pgd_runs_k_adversarial_passes_and_one_restore_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        dir.path(),
        json!({ "adv_mode": "PGD", "K": 3, "epsilon": 0.01, "num_epochs": 1 }),
    );
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();

    let batches = 2;
    assert_eq!(
        trainer.counters(),
        PassCounters {
            forwards: 4 * batches,
            backwards: 4 * batches,
            adv_steps: 3 * batches,
            restores: batches,
            optimizer_steps: batches,
        }
    );

    let embedding = trainer.params().get("embedding").unwrap();
    assert!(embedding.backup().is_none());
    assert!(embedding.grad().iter().all(|&g| g == 0.));
}

#[test]
fn fgsm_runs_one_adversarial_pass_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), json!({ "adv_mode": "FGSM", "num_epochs": 1 }));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();

    let counters = trainer.counters();
    assert_eq!(counters.forwards, 4);
    assert_eq!(counters.adv_steps, 2);
    assert_eq!(counters.restores, 2);
    assert_eq!(counters.optimizer_steps, 2);
}

#[test]
fn free_steps_the_optimizer_on_every_sub_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        dir.path(),
        json!({ "adv_mode": "FREE", "K": 3, "epsilon": 0.05, "num_epochs": 1 }),
    );
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();

    let counters = trainer.counters();
    assert_eq!(counters.forwards, 6);
    assert_eq!(counters.adv_steps, 6);
    assert_eq!(counters.optimizer_steps, 6);
    assert_eq!(counters.restores, 0);
    assert!(trainer.params().get("embedding").unwrap().backup().is_none());
}

#[test]
fn single_step_pgd_trains_like_fgsm() {
    let dir = tempfile::tempdir().unwrap();
    let overrides = |mode: &str| {
        json!({
            "adv_mode": mode,
            "K": 1,
            "epsilon": 0.05,
            "optimizer": { "type": "gradient_descent" },
            "learning_rate": 0.1
        })
    };

    let mut pgd = TrainerBuilder::new()
        .build(&config(dir.path(), overrides("PGD")), MemorySink::new())
        .unwrap();
    let mut fgsm = TrainerBuilder::new()
        .build(&config(dir.path(), overrides("FGSM")), MemorySink::new())
        .unwrap();

    pgd.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();
    fgsm.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();

    for (a, b) in pgd.params().front().zip(fgsm.params().front()) {
        assert_eq!(a.name(), b.name());
        for (x, y) in a.value().iter().zip(b.value()) {
            assert!((x - y).abs() < 1e-4, "{}: {x} vs {y}", a.name());
        }
    }
}

#[test]
fn scalars_are_reported_every_eval_every_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), json!({ "eval_every": 2 }));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();

    let steps: Vec<_> = trainer.sink().series("acc/dev").iter().map(|s| s.0).collect();
    assert_eq!(steps, [0, 2]);
}

#[test]
fn early_stopping_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();

    let patient = config(dir.path(), json!({ "require_improvement": 0, "eval_every": 1 }));
    let mut trainer = TrainerBuilder::new().build(&patient, MemorySink::new()).unwrap();
    let state = trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();
    assert_eq!(state.total_batch, 4);

    let stopping = config(
        dir.path(),
        json!({ "require_improvement": 0, "eval_every": 1, "early_stopping": true }),
    );
    let mut trainer = TrainerBuilder::new().build(&stopping, MemorySink::new()).unwrap();
    let state = trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();
    assert_eq!(state.total_batch, 1);
}

#[test]
fn testing_without_training_has_no_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), json!({}));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    let err = trainer.test(&mut loader(4, 2)).unwrap_err();
    assert!(matches!(err, TrainErr::NoCheckpoint { .. }));
}

#[test]
fn same_seed_builds_the_same_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), json!({}));
    let a = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();
    let b = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();

    for (a, b) in a.params().front().zip(b.params().front()) {
        assert_eq!(a.value(), b.value());
    }
}
