use crate::config::ModelConfig;
use crate::detection::RawDetection;
use image::{imageops::FilterType, GenericImageView};
use ndarray::{s, Array, Axis, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use thiserror::Error;

const INPUT_SIZE: u32 = 640;
const NMS_IOU_THRESHOLD: f32 = 0.7;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Failed to initialize ONNX runtime: {0}")]
    InitFailed(#[from] ort::Error),
    #[error("Failed to load class labels: {0}")]
    LabelsLoadFailed(#[from] io::Error),
    #[error("Image transformation error: {0}")]
    ImageTransformFailed(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

/// Object-detection boundary: encoded frame in, raw boxes out. The engine
/// never looks behind this seam.
pub trait Detector: Send + Sync + 'static {
    fn detect(&self, image_data: &[u8]) -> Result<Vec<RawDetection>, DetectorError>;
}

fn intersection(box1: &RawDetection, box2: &RawDetection) -> f32 {
    (box1.x2.min(box2.x2) - box1.x1.max(box2.x1)) * (box1.y2.min(box2.y2) - box1.y1.max(box2.y1))
}

fn union(box1: &RawDetection, box2: &RawDetection) -> f32 {
    ((box1.x2 - box1.x1) * (box1.y2 - box1.y1)) + ((box2.x2 - box2.x1) * (box2.y2 - box2.y1))
        - intersection(box1, box2)
}

fn transform_image(image_data: &[u8]) -> Result<(Array<f32, Ix4>, u32, u32), String> {
    let image_reader = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| format!("Error decoding image: {}", e))?;

    let original_img = image_reader
        .decode()
        .map_err(|e| format!("Error decoding image: {}", e))?;

    let (img_width, img_height) = original_img.dimensions();
    let img = original_img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let mut input = Array::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for pixel in img.pixels() {
        let x = pixel.0 as _;
        let y = pixel.1 as _;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, 0, y, x]] = (r as f32) / 255.;
        input[[0, 1, y, x]] = (g as f32) / 255.;
        input[[0, 2, y, x]] = (b as f32) / 255.;
    }

    Ok((input, img_height, img_width))
}

/// ONNX-backed detector with a round-robin session pool.
pub struct OrtDetector {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    min_probability: f32,
}

impl OrtDetector {
    pub fn new(model_config: &ModelConfig) -> Result<Self, DetectorError> {
        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_config.get_model_path())?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        tracing::info!("Created {} ONNX sessions", num_instances);

        Ok(Self {
            counter: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(sessions),
            min_probability: model_config.min_probability,
        })
    }

    fn run_inference(&self, input: &Array<f32, Ix4>) -> Result<ndarray::ArrayD<f32>, DetectorError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let session_arc = &self.sessions[index];
        let mut session = session_arc
            .lock()
            .map_err(|e| DetectorError::InferenceFailed(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Running inference with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| DetectorError::InferenceFailed(format!("failed to build tensor: {}", e)))?;

        let input_tensor = ort::inputs![tensor_ref];

        let outputs = session
            .run(input_tensor)
            .map_err(|e| DetectorError::InferenceFailed(format!("inference failed: {}", e)))?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("failed to extract tensor: {}", e)))?;

        let ix = shape.to_ixdyn();
        let array = ndarray::ArrayD::from_shape_vec(ix, data.to_vec())
            .map_err(|e| DetectorError::InferenceFailed(format!("invalid tensor shape: {}", e)))?;

        Ok(array)
    }
}

impl Detector for OrtDetector {
    fn detect(&self, image_data: &[u8]) -> Result<Vec<RawDetection>, DetectorError> {
        let (input, img_height, img_width) =
            transform_image(image_data).map_err(DetectorError::ImageTransformFailed)?;

        let outputs = self.run_inference(&input)?;

        let mut boxes = Vec::new();
        let output = outputs.slice(s![.., .., 0]);

        for row in output.axis_iter(Axis(0)) {
            let row: Vec<_> = row.iter().copied().collect();
            let (class_id, prob) = row
                .iter()
                .skip(4)
                .enumerate()
                .map(|(index, value)| (index, *value))
                .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
                .ok_or_else(|| {
                    DetectorError::InferenceFailed("output row has no class scores".to_string())
                })?;

            if prob < self.min_probability {
                continue;
            }

            let xc = row[0] / INPUT_SIZE as f32 * (img_width as f32);
            let yc = row[1] / INPUT_SIZE as f32 * (img_height as f32);
            let w = row[2] / INPUT_SIZE as f32 * (img_width as f32);
            let h = row[3] / INPUT_SIZE as f32 * (img_height as f32);

            boxes.push(RawDetection {
                class_id: class_id as i64,
                confidence: prob,
                x1: xc - w / 2.,
                y1: yc - h / 2.,
                x2: xc + w / 2.,
                y2: yc + h / 2.,
            });
        }

        boxes.sort_by(|box1, box2| box2.confidence.total_cmp(&box1.confidence));
        let mut result = Vec::new();

        while !boxes.is_empty() {
            result.push(boxes[0]);
            boxes = boxes
                .iter()
                .filter(|box1| intersection(&boxes[0], box1) / union(&boxes[0], box1) < NMS_IOU_THRESHOLD)
                .cloned()
                .collect();
        }

        tracing::debug!("Detector returned {} boxes", result.len());
        Ok(result)
    }
}

/// Loads the class-index to label-name table shipped next to the model,
/// one label per line, index implied by line order.
pub fn load_class_labels(filepath: &Path) -> io::Result<Vec<String>> {
    let file = File::open(filepath)?;
    let reader = io::BufReader::new(file);
    let mut labels = Vec::new();

    for line_result in reader.lines() {
        let line = line_result?;
        let label = line.trim();
        if label.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Empty label line in labels file",
            ));
        }
        labels.push(label.to_string());
    }

    Ok(labels)
}
