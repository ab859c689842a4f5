use std::{env, num::NonZeroUsize, path::Path};

use anyhow::{Context, Result, bail};
use log::info;

use adversarial_training::{
    config::TrainConfig,
    data::{DataLoader, TextDataset},
    metrics::JsonlSink,
    training::TrainerBuilder,
};

fn load(path: &Path, config: &TrainConfig, batch_size: NonZeroUsize) -> Result<DataLoader> {
    let dataset = TextDataset::from_jsonl(path, config.model.pad_size, config.data.pad_id)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;

    dataset.check(config.num_classes(), config.model.vocab_size)?;
    info!("loaded {} samples from {}", dataset.len(), path.display());
    Ok(DataLoader::new(dataset, batch_size))
}

fn main() -> Result<()> {
    env_logger::init();

    let Some(config_path) = env::args().nth(1) else {
        bail!("usage: adversarial-training <config.json>");
    };

    let config = TrainConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config {config_path}"))?;

    let batch_size = config.batch_size;
    let mut train = load(&config.data.train_path, &config, batch_size)?;
    let mut dev = load(&config.data.dev_path, &config, batch_size)?;
    let mut test = load(&config.data.test_path, &config, batch_size)?;

    let sink = JsonlSink::create(&config.log_path)?;
    info!("reporting scalars to {}", sink.path().display());

    let mut trainer = TrainerBuilder::new().build(&config, sink)?;
    trainer.run(&mut train, &mut dev, &mut test)?;
    Ok(())
}
