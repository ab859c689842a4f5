use ndarray::{Array2, Array3, ArrayView2};
use rand::Rng;

use super::{
    Model,
    activations::ActFn,
    layers::{Dense, Embedding, MeanPool},
};
use crate::{Result, TrainErr, data::Batch, params::ParamStore};

/// The name of the embedding table's parameter.
pub const EMBEDDING: &str = "embedding";

/// A bag-of-embeddings text classifier: embedding lookup, masked mean pooling, one hidden
/// dense layer and a linear output layer producing logits.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    embedding: Embedding,
    pool: MeanPool,
    hidden: Dense,
    output: Dense,
    delta: Option<Array2<f32>>,
}

impl TextClassifier {
    /// Creates a new `TextClassifier`.
    ///
    /// # Arguments
    /// * `vocab_size` - The amount of rows in the embedding table.
    /// * `embed_dim` - The width of each embedding.
    /// * `hidden_dim` - The width of the hidden layer.
    /// * `num_classes` - The amount of output classes.
    /// * `act_fn` - The hidden layer's activation.
    pub fn new(
        vocab_size: usize,
        embed_dim: usize,
        hidden_dim: usize,
        num_classes: usize,
        act_fn: ActFn,
    ) -> Self {
        Self {
            embedding: Embedding::new(EMBEDDING, vocab_size, embed_dim),
            pool: MeanPool::new(),
            hidden: Dense::new("dense_0", (embed_dim, hidden_dim), Some(act_fn)),
            output: Dense::new("dense_1", (hidden_dim, num_classes), None),
            delta: None,
        }
    }

    /// Creates a store with a freshly initialized parameter for every layer.
    pub fn init_params<R: Rng>(&self, rng: &mut R) -> Result<ParamStore> {
        let mut store = ParamStore::new();
        store.register(self.embedding.init_param(rng)?)?;
        store.register(self.hidden.init_param(rng)?)?;
        store.register(self.output.init_param(rng)?)?;
        Ok(store)
    }

    fn add_delta(&self, embedded: &mut Array3<f32>) -> Result<()> {
        let Some(delta) = &self.delta else {
            return Ok(());
        };

        let (_, seq, dim) = embedded.dim();
        if delta.dim() != (seq, dim) {
            return Err(TrainErr::SizeMismatch {
                what: "perturbation",
                got: delta.len(),
                expected: seq * dim,
            });
        }

        *embedded += delta;
        Ok(())
    }
}

impl Model for TextClassifier {
    fn embedding(&self) -> &str {
        self.embedding.name()
    }

    fn num_classes(&self) -> usize {
        self.output.dim().1
    }

    fn set_delta(&mut self, delta: Option<Array2<f32>>) {
        self.delta = delta;
    }

    fn forward(&mut self, params: &ParamStore, batch: &Batch) -> Result<Array2<f32>> {
        let table = params.get(self.embedding.name())?.value();
        let mut embedded = self.embedding.forward(table, batch.inputs())?;
        self.add_delta(&mut embedded)?;

        let pooled = self.pool.forward(embedded.view(), batch.seq_lens())?;
        let hidden = self
            .hidden
            .forward(params.get(self.hidden.name())?.value(), pooled.view())?;

        self.output
            .forward(params.get(self.output.name())?.value(), hidden.view())
    }

    fn backward(&mut self, params: &mut ParamStore, d: ArrayView2<f32>) -> Result<()> {
        let (value, grad) = params.get_mut(self.output.name())?.value_and_grad_mut();
        let d = self.output.backward(value, grad, d)?;

        let (value, grad) = params.get_mut(self.hidden.name())?.value_and_grad_mut();
        let d = self.hidden.backward(value, grad, d.view())?;

        let d = self.pool.backward(d.view())?;
        let grad = params.get_mut(self.embedding.name())?.grad_mut();
        self.embedding.backward(grad, d.view())
    }

    fn infer(&self, params: &ParamStore, batch: &Batch) -> Result<Array2<f32>> {
        let table = params.get(self.embedding.name())?.value();
        let embedded = self.embedding.infer(table, batch.inputs())?;
        let pooled = self.pool.infer(embedded.view(), batch.seq_lens())?;
        let hidden = self
            .hidden
            .infer(params.get(self.hidden.name())?.value(), pooled.view())?;

        self.output
            .infer(params.get(self.output.name())?.value(), hidden.view())
    }
}
