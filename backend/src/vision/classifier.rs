use super::preprocess::NormalizedImage;
use shared::Severity;
use std::path::PathBuf;
use std::sync::Mutex;
use tch::nn::{self, ModuleT};
use tch::{CModule, Device, Kind, Tensor};

/// Per-model input scaling applied on top of the shared [0, 1] normalization.
/// Swapping this changes the numbers a model sees, so each classifier pins
/// the transform its backbone was trained with.
#[derive(Debug, Clone, Copy)]
pub enum Preprocessing {
    /// MobileNet family: rescale channels to [-1, 1].
    Mobilenet,
    /// EfficientNet family: ImageNet channel mean/std.
    Imagenet,
}

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

impl Preprocessing {
    fn apply(&self, input: &Tensor) -> Tensor {
        match self {
            Preprocessing::Mobilenet => input * 2.0 - 1.0,
            Preprocessing::Imagenet => {
                let mean = Tensor::from_slice(&IMAGENET_MEAN)
                    .view([1, 3, 1, 1])
                    .to_device(input.device());
                let std = Tensor::from_slice(&IMAGENET_STD)
                    .view([1, 3, 1, 1])
                    .to_device(input.device());
                (input - mean) / std
            }
        }
    }
}

/// Everything that distinguishes one classifier from another: the artifact
/// to load, the label set, the static severity table and the input transform.
#[derive(Debug)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels: &'static [&'static str],
    pub severity_map: &'static [(&'static str, Severity)],
    pub preprocessing: Preprocessing,
}

#[derive(Debug, Clone)]
pub struct ClassPrediction {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
    /// Softmax scores aligned with the classifier's label set.
    pub scores: Vec<f32>,
}

#[derive(Debug)]
enum ModelState {
    Unloaded,
    Ready(LoadedModel),
}

#[derive(Debug)]
enum LoadedModel {
    Scripted(CModule),
    Fallback(FallbackNet),
}

/// Small untrained conv net standing in for a missing or unreadable
/// artifact: predictions are arbitrary but well-typed, so the service keeps
/// answering instead of erroring.
#[derive(Debug)]
struct FallbackNet {
    _vs: nn::VarStore,
    net: nn::SequentialT,
}

impl FallbackNet {
    fn new(device: Device, num_classes: i64) -> Self {
        let vs = nn::VarStore::new(device);
        let root = vs.root();
        let conv_cfg = nn::ConvConfig {
            stride: 2,
            padding: 1,
            ..Default::default()
        };
        let net = nn::seq_t()
            .add(nn::conv2d(&root / "conv1", 3, 16, 3, conv_cfg))
            .add_fn(|t| t.relu())
            .add(nn::conv2d(&root / "conv2", 16, 32, 3, conv_cfg))
            .add_fn(|t| t.relu())
            .add(nn::conv2d(&root / "conv3", 32, 64, 3, conv_cfg))
            .add_fn(|t| t.relu())
            .add_fn(|t| t.adaptive_avg_pool2d([1, 1]).flatten(1, -1))
            .add(nn::linear(&root / "fc", 64, num_classes, Default::default()));
        Self { _vs: vs, net }
    }
}

/// A single image classifier: lazy-loaded model plus its label and severity
/// tables. One instance per crop (and one for the crop detector itself).
#[derive(Debug)]
pub struct ImageClassifier {
    config: ClassifierConfig,
    device: Device,
    state: Mutex<ModelState>,
}

impl ImageClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            device: Device::cuda_if_available(),
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.config.labels
    }

    /// Severity tier for a disease label; labels outside the table fall
    /// back to medium.
    pub fn severity_for(&self, label: &str) -> Severity {
        self.config
            .severity_map
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, severity)| *severity)
            .unwrap_or_default()
    }

    /// Ensures the model is loaded. Called eagerly at startup; `predict`
    /// also calls it so the first request is safe without a prior load.
    pub fn load(&self) {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, ModelState::Unloaded) {
            *state = ModelState::Ready(self.load_model());
        }
    }

    fn load_model(&self) -> LoadedModel {
        if self.config.model_path.exists() {
            match CModule::load_on_device(&self.config.model_path, self.device) {
                Ok(module) => {
                    log::info!("Model loaded from {}", self.config.model_path.display());
                    return LoadedModel::Scripted(module);
                }
                Err(e) => {
                    log::warn!(
                        "Failed to load model {}: {e}, creating untrained model",
                        self.config.model_path.display()
                    );
                }
            }
        } else {
            log::warn!(
                "Model not found at {}, creating untrained model",
                self.config.model_path.display()
            );
        }
        LoadedModel::Fallback(FallbackNet::new(self.device, self.config.labels.len() as i64))
    }

    pub fn predict(&self, image: &NormalizedImage) -> Result<ClassPrediction, tch::TchError> {
        let input = self.config.preprocessing.apply(&self.image_to_tensor(image));

        let mut state = self.state.lock().unwrap();
        if matches!(*state, ModelState::Unloaded) {
            *state = ModelState::Ready(self.load_model());
        }
        let logits = match &*state {
            ModelState::Ready(LoadedModel::Scripted(module)) => module.forward_ts(&[input])?,
            ModelState::Ready(LoadedModel::Fallback(fallback)) => {
                fallback.net.forward_t(&input, false)
            }
            ModelState::Unloaded => unreachable!("model loaded above"),
        };

        let probs = logits.softmax(-1, Kind::Float).view([-1]);
        let num_classes = self.config.labels.len();
        let mut scores = vec![0.0f32; num_classes];
        probs.copy_data(&mut scores, num_classes);

        let (index, confidence) = scores
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap_or((0, 0.0));

        Ok(ClassPrediction {
            index,
            label: self.config.labels[index].to_string(),
            confidence,
            scores,
        })
    }

    fn image_to_tensor(&self, image: &NormalizedImage) -> Tensor {
        let (height, width, channels) = image.pixels.dim();
        let data = image.pixels.as_standard_layout();
        Tensor::from_slice(data.as_slice().unwrap())
            .view([height as i64, width as i64, channels as i64])
            .permute([2, 0, 1])
            .unsqueeze(0)
            .to_device(self.device)
    }
}
