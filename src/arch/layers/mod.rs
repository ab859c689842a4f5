mod dense;
mod embedding;
mod mean_pool;

pub use dense::Dense;
pub use embedding::Embedding;
pub use mean_pool::MeanPool;
