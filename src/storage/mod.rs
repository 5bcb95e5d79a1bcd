//! Durable state: the model bundle file and the real training sample store.

mod bundle;
mod training;

pub use bundle::ModelBundle;
pub use training::TrainingStore;
