//! The trained fraud classifier as a polymorphic capability.

use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::models::loader::{LoadedModel, ModelLoader};

/// An externally trained classifier over a single feature row.
///
/// Implementations are immutable once loaded; the pipeline only queries
/// them.
pub trait FraudClassifier {
    /// Probability of the fraud class, in [0, 1].
    fn predict_proba(&self, features: &[f64]) -> Result<f64>;

    /// Binary fraud label.
    fn predict(&self, features: &[f64]) -> Result<u8> {
        Ok(u8::from(self.predict_proba(features)? >= 0.5))
    }
}

/// ONNX-backed classifier.
///
/// Handles both tensor probability outputs (XGBoost, RandomForest exports)
/// and seq(map) outputs (CatBoost, LightGBM exports).
pub struct OnnxClassifier {
    model: RwLock<LoadedModel>,
}

impl OnnxClassifier {
    /// Load the classifier artifact from file.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(path)?;
        Ok(Self {
            model: RwLock::new(model),
        })
    }

    fn run(&self, features: &[f64]) -> Result<f64> {
        use ort::value::Tensor;

        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model_name = model.name.clone();
        let output_name = model.output_name.clone();
        let input_name = model.input_name.clone();

        let outputs = model
            .session
            .run(ort::inputs![&input_name => input_tensor])?;

        Self::extract_probability(&outputs, &output_name, &model_name)
    }

    /// Extract the fraud probability from model output, trying the named
    /// output first and falling back to any non-label output.
    fn extract_probability(
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        model_name: &str,
    ) -> Result<f64> {
        if let Some(output) = outputs.get(output_name) {
            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = Self::fraud_prob_from_tensor(&shape, data);
                debug!(model = %model_name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = Self::extract_from_sequence_map(output, model_name) {
                    return Ok(prob);
                }
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                let prob = Self::fraud_prob_from_tensor(&shape, data);
                debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = Self::extract_from_sequence_map(&output, model_name) {
                    return Ok(prob);
                }
            }
        }

        warn!(model = %model_name, "Could not extract probability, using default 0.5");
        Ok(0.5)
    }

    /// Probability from a seq(map(int64, float)) output.
    fn extract_from_sequence_map(
        output: &ort::value::DynValue,
        model_name: &str,
    ) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        if maps.is_empty() {
            return Err(anyhow::anyhow!("Empty sequence"));
        }

        let kv_pairs = maps[0].try_extract_key_values::<i64, f32>()?;

        for (class_id, prob) in &kv_pairs {
            if *class_id == 1 {
                debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
                return Ok(*prob as f64);
            }
        }

        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 {
                return Ok(1.0 - *prob as f64);
            }
        }

        Err(anyhow::anyhow!("No probability found in map"))
    }

    /// Probability from a tensor output of shape [1, classes] or [classes].
    fn fraud_prob_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
        let dims: Vec<i64> = shape.iter().copied().collect();

        if dims.len() == 2 {
            let num_classes = dims[1] as usize;
            if num_classes >= 2 {
                return data[1] as f64;
            } else if num_classes == 1 {
                return data[0] as f64;
            }
        } else if dims.len() == 1 {
            let num_classes = dims[0] as usize;
            if num_classes >= 2 {
                return data[1] as f64;
            } else if num_classes == 1 {
                return data[0] as f64;
            }
        }

        data.last().map(|&v| v as f64).unwrap_or(0.5)
    }
}

impl FraudClassifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        Ok(self.run(features)?.clamp(0.0, 1.0))
    }
}
