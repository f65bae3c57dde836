use anyhow::{Context, Result};
use ndarray::{ArrayD, ArrayViewD};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};

use crate::error::DetectError;
use crate::mapping::load_class_names;
use crate::pipeline::Model;

/// Builds an ONNX Runtime session with the selected execution provider.
pub struct OnnxModel {
    provider: [ort::execution_providers::ExecutionProviderDispatch; 1],
}

impl OnnxModel {
    pub fn new(cuda: bool) -> Self {
        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        Self { provider }
    }

    pub fn load_model(&self, model_path: &str) -> Result<Session> {
        let session = SessionBuilder::new()?
            .with_execution_providers(self.provider.clone())?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(session)
    }
}

/// The loaded model handle: a committed session plus the class-name list
/// its class ids index into. Built once at startup and reused for every
/// request; load failures are fatal, never retried.
pub struct YoloDetector {
    session: Session,
    classes: Vec<String>,
}

impl YoloDetector {
    pub fn new(model_path: &str, names_path: &str, cuda: bool) -> Result<Self> {
        let classes = load_class_names(names_path)
            .with_context(|| format!("failed to read class names from {names_path}"))?;
        let session = OnnxModel::new(cuda)
            .load_model(model_path)
            .with_context(|| format!("failed to load model from {model_path}"))?;
        tracing::info!(model = model_path, classes = classes.len(), "detector loaded");
        Ok(Self { session, classes })
    }
}

impl Model for YoloDetector {
    fn forward(&self, blob: ArrayViewD<'_, f32>) -> Result<Vec<ArrayD<f32>>, DetectError> {
        let input_data = ort::inputs![blob]?;
        let ys = self.session.run(input_data)?;
        ys.iter()
            .map(|(_k, v)| Ok(v.try_extract_tensor::<f32>()?.into_owned()))
            .collect()
    }

    fn class_names(&self) -> &[String] {
        &self.classes
    }
}
