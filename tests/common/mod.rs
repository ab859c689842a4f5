#![allow(dead_code)]

use std::{num::NonZeroUsize, path::Path};

use adversarial_training::{
    config::TrainConfig,
    data::{DataLoader, TextDataset},
};
use serde_json::json;

pub const VOCAB_SIZE: usize = 10;
pub const PAD_SIZE: usize = 4;
pub const EMBED_DIM: usize = 6;
pub const HIDDEN_DIM: usize = 8;
pub const SEED: u64 = 7;

/// Class 0 sentences use tokens 1..=4, class 1 sentences tokens 5..=8.
pub fn samples(n: usize) -> Vec<(Vec<usize>, usize)> {
    (0..n)
        .map(|i| {
            let label = i % 2;
            let base = 1 + 4 * label;
            let len = 2 + i % 3;
            let tokens = (0..len).map(|j| base + (i + j) % 4).collect();
            (tokens, label)
        })
        .collect()
}

pub fn loader(n: usize, batch_size: usize) -> DataLoader {
    let dataset = TextDataset::new(samples(n), PAD_SIZE, 0).unwrap();
    DataLoader::new(dataset, NonZeroUsize::new(batch_size).unwrap())
}

/// A small valid configuration writing its checkpoint and logs under `dir`.
pub fn config(dir: &Path, overrides: serde_json::Value) -> TrainConfig {
    let mut value = json!({
        "learning_rate": 0.01,
        "num_epochs": 2,
        "batch_size": 5,
        "epsilon": 0.01,
        "class_list": ["neg", "pos"],
        "save_path": dir.join("saved").join("model.safetensors"),
        "log_path": dir.join("logs"),
        "seed": SEED,
        "model": {
            "vocab_size": VOCAB_SIZE,
            "embed_dim": EMBED_DIM,
            "hidden_dim": HIDDEN_DIM,
            "pad_size": PAD_SIZE
        },
        "data": {
            "train_path": dir.join("train.jsonl"),
            "dev_path": dir.join("dev.jsonl"),
            "test_path": dir.join("test.jsonl")
        }
    });

    if let (Some(base), Some(extra)) = (value.as_object_mut(), overrides.as_object()) {
        base.extend(extra.clone());
    }

    serde_json::from_value(value).unwrap()
}
