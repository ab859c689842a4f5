mod batch;
mod dataloader;
mod dataset;

pub use batch::Batch;
pub use dataloader::DataLoader;
pub use dataset::{Sample, TextDataset};
