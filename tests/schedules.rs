mod common;

use adversarial_training::{
    adversarial::{Adversary, Attack, Fgsm, Free, Pgd},
    arch::{EMBEDDING, Model, TextClassifier, activations::ActFn, loss::CrossEntropy},
    data::Batch,
    metrics::MemorySink,
    optimization::GradientDescent,
    params::ParamStore,
    training::{Grads, Learner, TrainerBuilder},
};
use rand::{SeedableRng, rngs::StdRng};
use serde_json::json;

use common::{EMBED_DIM, HIDDEN_DIM, PAD_SIZE, SEED, VOCAB_SIZE, config, loader};

const LR: f32 = 1.0;
const EPSILON: f32 = 0.05;

type RefLearner = Learner<TextClassifier, GradientDescent, CrossEntropy>;

/// A learner starting from the same parameters a seeded trainer does.
fn mk_learner() -> RefLearner {
    let model = TextClassifier::new(VOCAB_SIZE, EMBED_DIM, HIDDEN_DIM, 2, ActFn::relu());
    let params = model
        .init_params(&mut StdRng::seed_from_u64(SEED))
        .unwrap();
    let optimizers = params.front().map(|_| GradientDescent::new(LR)).collect();
    Learner::new(model, params, optimizers, CrossEntropy::new())
}

fn mk_overrides(mode: &str, k: usize, num_epochs: usize) -> serde_json::Value {
    json!({
        "adv_mode": mode,
        "K": k,
        "epsilon": EPSILON,
        "num_epochs": num_epochs,
        "learning_rate": LR,
        "optimizer": { "type": "gradient_descent" }
    })
}

fn single_batch() -> Batch {
    loader(5, 5).next().unwrap()
}

/// Applies one gradient descent step of `clean + adversarial` onto `params`.
fn descend(params: &ParamStore, clean: &[Vec<f32>], adversarial: &[Vec<f32>]) -> Vec<Vec<f32>> {
    params
        .front()
        .zip(clean.iter().zip(adversarial))
        .map(|(p, (clean, adversarial))| {
            p.value()
                .iter()
                .zip(clean.iter().zip(adversarial))
                .map(|(v, (c, a))| v - LR * (c + a))
                .collect()
        })
        .collect()
}

fn assert_close(params: &ParamStore, expected: &[Vec<f32>], tol: f32) {
    for (p, e) in params.front().zip(expected) {
        for (v, e) in p.value().iter().zip(e) {
            assert!((v - e).abs() <= tol, "{}: {v} vs {e}", p.name());
        }
    }
}

#[test]
fn fgsm_steps_on_clean_plus_adversarial_gradient() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), mk_overrides("FGSM", 1, 1));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();
    trainer.train(&mut loader(5, 5), &mut loader(4, 4)).unwrap();

    let batch = single_batch();
    let mut learner = mk_learner();
    learner.pass(&batch, Grads::Zero).unwrap();
    let clean = learner.params().grads();

    let mut fgsm = Fgsm::new(EMBEDDING);
    fgsm.attack(learner.params_mut(), EPSILON, true).unwrap();
    learner.pass(&batch, Grads::Zero).unwrap();
    let adversarial = learner.params().grads();
    fgsm.restore(learner.params_mut()).unwrap();

    let expected = descend(learner.params(), &clean, &adversarial);
    assert_close(trainer.params(), &expected, 1e-5);
}

#[test]
fn pgd_steps_on_clean_plus_last_adversarial_gradient() {
    const K: usize = 3;

    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), mk_overrides("PGD", K, 1));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();
    trainer.train(&mut loader(5, 5), &mut loader(4, 4)).unwrap();

    let batch = single_batch();
    let mut learner = mk_learner();
    learner.pass(&batch, Grads::Zero).unwrap();
    let clean = learner.params().grads();

    let mut pgd = Pgd::new(EMBEDDING, None);
    for t in 0..K {
        pgd.attack(learner.params_mut(), EPSILON, t == 0).unwrap();
        learner.pass(&batch, Grads::Zero).unwrap();
    }
    let last = learner.params().grads();
    pgd.restore(learner.params_mut()).unwrap();

    let expected = descend(learner.params(), &clean, &last);
    assert_close(trainer.params(), &expected, 1e-5);
}

#[test]
fn free_delta_carries_across_batches_and_resets_each_epoch() {
    const K: usize = 2;
    const EPOCHS: usize = 2;

    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), mk_overrides("FREE", K, EPOCHS));
    let mut trainer = TrainerBuilder::new().build(&config, MemorySink::new()).unwrap();
    trainer.train(&mut loader(10, 5), &mut loader(4, 4)).unwrap();

    let batches: Vec<Batch> = loader(10, 5).collect();
    assert_eq!(batches.len(), 2);

    let mut learner = mk_learner();
    let mut free = Free::new(EMBEDDING, PAD_SIZE, EMBED_DIM);
    for _ in 0..EPOCHS {
        free.begin_epoch();
        for batch in &batches {
            for _ in 0..K {
                learner.model_mut().set_delta(Some(free.delta().clone()));
                learner.pass(batch, Grads::Zero).unwrap();
                free.attack(learner.params_mut(), EPSILON, false).unwrap();
                learner.step().unwrap();
                free.clear_attacked_grad(learner.params_mut()).unwrap();
            }
        }
    }

    let Attack::Free(trained) = trainer.attack() else {
        panic!("expected the free strategy, got {}", trainer.attack().mode());
    };

    assert!(trained.delta().iter().any(|&d| d != 0.));
    for (a, b) in trained.delta().iter().zip(free.delta()) {
        assert!((a - b).abs() <= 1e-6, "{a} vs {b}");
    }

    let expected: Vec<Vec<f32>> = learner.params().front().map(|p| p.value().to_vec()).collect();
    assert_close(trainer.params(), &expected, 1e-5);
}
