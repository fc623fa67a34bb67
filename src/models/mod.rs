//! Classifier boundary: an externally trained model loaded as an
//! immutable artifact

pub mod classifier;
pub mod loader;

pub use classifier::{FraudClassifier, OnnxClassifier};
pub use loader::ModelLoader;
