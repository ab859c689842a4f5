use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use crate::{Result, TrainErr, params::ParamStore, training::TrainingState};

const TOTAL_BATCH: &str = "total_batch";
const BEST_LOSS: &str = "best_loss";
const LAST_IMPROVE: &str = "last_improve";

/// A single checkpoint slot on disk, stored as a safetensors file with one `F32` tensor per
/// parameter and the training state as metadata.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the slot with every parameter of `params` and `state`.
    ///
    /// # Arguments
    /// * `params` - The parameters to persist.
    /// * `state` - The training state at the time of saving.
    pub fn save(&self, params: &ParamStore, state: &TrainingState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let views = params
            .front()
            .map(|p| {
                let bytes: &[u8] = bytemuck::cast_slice(p.value());
                let view = TensorView::new(Dtype::F32, p.shape().to_vec(), bytes)?;
                Ok((p.name(), view))
            })
            .collect::<Result<Vec<_>>>()?;

        let metadata = HashMap::from([
            (TOTAL_BATCH.to_string(), state.total_batch.to_string()),
            (BEST_LOSS.to_string(), state.best_loss.to_string()),
            (LAST_IMPROVE.to_string(), state.last_improve.to_string()),
        ]);

        let bytes = safetensors::serialize(views, &Some(metadata))?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Loads the slot into `params`, overwriting the value of every stored parameter.
    ///
    /// # Arguments
    /// * `params` - The store to load into, whose parameters must match the stored ones.
    ///
    /// # Returns
    /// The training state saved alongside the parameters, or an error if the file is
    /// missing, malformed or doesn't fit `params`.
    pub fn load(&self, params: &mut ParamStore) -> Result<TrainingState> {
        let bytes = fs::read(&self.path)?;
        let tensors = SafeTensors::deserialize(&bytes)?;

        if tensors.len() != params.len() {
            return Err(TrainErr::SizeMismatch {
                what: "checkpoint tensors",
                got: tensors.len(),
                expected: params.len(),
            });
        }

        let mut values = Vec::with_capacity(tensors.len());
        for (name, view) in tensors.tensors() {
            let param = params.get(&name)?;
            if view.dtype() != Dtype::F32 {
                return Err(TrainErr::CorruptCheckpoint(format!(
                    "tensor `{name}` has dtype {:?}, expected F32",
                    view.dtype()
                )));
            }

            if view.shape() != param.shape() {
                return Err(TrainErr::CorruptCheckpoint(format!(
                    "tensor `{name}` has shape {:?}, expected {:?}",
                    view.shape(),
                    param.shape()
                )));
            }

            let value: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
            values.push((name, value));
        }

        let (_, metadata) = SafeTensors::read_metadata(&bytes)?;
        let metadata = metadata.metadata().clone().unwrap_or_default();
        let state = TrainingState {
            total_batch: parse_meta(&metadata, TOTAL_BATCH)?,
            best_loss: parse_meta(&metadata, BEST_LOSS)?,
            last_improve: parse_meta(&metadata, LAST_IMPROVE)?,
        };

        // Nothing is overwritten until the whole file checked out.
        for (name, value) in values {
            params.get_mut(&name)?.assign(&value)?;
        }

        Ok(state)
    }
}

fn parse_meta<T: std::str::FromStr>(metadata: &HashMap<String, String>, key: &str) -> Result<T> {
    metadata
        .get(key)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| TrainErr::CorruptCheckpoint(format!("missing or invalid `{key}`")))
}
