use crate::camera::Camera;
use crate::compliance::{assign_ppe_to_persons, split_person_ppe, PersonAssignment};
use crate::config::Config;
use crate::detection::{parse_detections, Detection};
use crate::detector::{load_class_labels, Detector, OrtDetector};
use crate::draw::{draw_person_status, draw_ppe_items};
use crate::sampling::should_run_detection;

use opencv::{
    core::{Mat, Size, Vector},
    highgui, imgcodecs, imgproc,
};
use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::signal;

const WINDOW_NAME: &str = "PPE Detection (Per Person)";

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let camera = match Camera::new(&config.camera) {
        Ok(cam) => cam,
        Err(e) => {
            tracing::error!("Failed to initialize camera: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let detector = match OrtDetector::new(&config.model) {
        Ok(detector) => detector,
        Err(e) => {
            tracing::error!("Failed to initialize detector: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let class_names = load_class_labels(&config.model.get_labels_path())?;
    tracing::info!("Loaded {} class labels", class_names.len());

    let stop = Arc::new(AtomicBool::new(false));
    let loop_stop = stop.clone();
    let mut loop_handle = tokio::task::spawn_blocking(move || {
        run_loop(camera, detector, class_names, config, loop_stop)
    });

    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, starting graceful shutdown.");
            stop.store(true, Ordering::Relaxed);
            loop_handle.await??;
        }
        result = &mut loop_handle => {
            result??;
        }
    }

    Ok(())
}

/// Per-frame driving loop. Owns the single last-result slot that stale
/// frames are redrawn from between detection cycles.
fn run_loop(
    mut camera: Camera,
    detector: OrtDetector,
    class_names: Vec<String>,
    config: Config,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let stride = config.camera.detection_stride;
    let mut last_assignments: Vec<PersonAssignment> = Vec::new();
    let mut last_ppes: Vec<Detection> = Vec::new();
    let mut frame_idx: u64 = 0;

    loop {
        if stop.load(Ordering::Relaxed) {
            tracing::info!("Processing loop received shutdown signal");
            break;
        }

        let Some(frame) = camera.read_frame()? else {
            tracing::info!("End of stream after {} frames", frame_idx);
            break;
        };

        let mut frame = resize_frame(&frame, config.camera.frame_width, config.camera.frame_height)?;

        if should_run_detection(frame_idx, stride) {
            match detect_cycle(&detector, &frame, &class_names, &config) {
                Ok((assignments, ppes)) => {
                    last_assignments = assignments;
                    last_ppes = ppes;
                }
                Err(e) => {
                    // keep redrawing the previous cycle's result
                    tracing::error!("Detection cycle failed: {:?}", e);
                }
            }
        }

        draw_ppe_items(&mut frame, &last_ppes)?;
        draw_person_status(&mut frame, &last_assignments)?;

        highgui::imshow(WINDOW_NAME, &frame)?;
        let key = highgui::wait_key(1)?;
        if key == 'q' as i32 {
            tracing::info!("Quit requested from display window");
            break;
        }

        frame_idx += 1;
    }

    highgui::destroy_all_windows()?;
    Ok(())
}

/// One full detection cycle: encode, detect, parse, split, assign.
fn detect_cycle(
    detector: &OrtDetector,
    frame: &Mat,
    class_names: &[String],
    config: &Config,
) -> anyhow::Result<(Vec<PersonAssignment>, Vec<Detection>)> {
    let image_data = encode_frame_to_jpg(frame)?;
    let raw = detector.detect(&image_data)?;

    let dets = parse_detections(&raw, class_names, &config.compliance);
    let (persons, ppes) = split_person_ppe(&dets, &config.compliance);
    let assignments = assign_ppe_to_persons(&persons, &ppes, &config.compliance);

    tracing::debug!(
        "Cycle: {} detections, {} persons, {} ppe candidates",
        dets.len(),
        assignments.len(),
        ppes.len()
    );

    Ok((assignments, ppes))
}

fn resize_frame(frame: &Mat, width: i32, height: i32) -> opencv::Result<Mat> {
    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(width, height),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;
    Ok(resized)
}

fn encode_frame_to_jpg(frame: &Mat) -> opencv::Result<Vec<u8>> {
    let mut buf = Vector::<u8>::new();
    imgcodecs::imencode(".jpg", frame, &mut buf, &Vector::new())?;
    Ok(buf.into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
