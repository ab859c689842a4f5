mod parameter;
mod store;

pub use parameter::Parameter;
pub use store::ParamStore;
