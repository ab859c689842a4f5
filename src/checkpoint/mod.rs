mod policy;
mod store;

pub use policy::CheckpointPolicy;
pub use store::CheckpointStore;
