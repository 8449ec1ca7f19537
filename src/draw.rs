use crate::compliance::PersonAssignment;
use crate::detection::Detection;
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    imgproc,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawError {
    #[error("OpenCV error: {0}")]
    OpenCvError(#[from] opencv::Error),
}

fn cyan() -> Scalar {
    Scalar::new(255.0, 255.0, 0.0, 0.0)
}

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

fn red() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

/// Thin box and raw label for every PPE candidate of the current cycle.
pub fn draw_ppe_items(frame: &mut Mat, items: &[Detection]) -> Result<(), DrawError> {
    for d in items {
        let b = d.bbox;
        imgproc::rectangle(
            frame,
            Rect::new(b.x1, b.y1, b.x2 - b.x1, b.y2 - b.y1),
            cyan(),
            1,
            imgproc::LINE_8,
            0,
        )?;
        imgproc::put_text(
            frame,
            &d.raw_label,
            Point::new(b.x1, b.y1 - 5),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.5,
            cyan(),
            1,
            imgproc::LINE_AA,
            false,
        )?;
    }
    Ok(())
}

/// Person boxes colored by compliance, with an OK / Missing status line.
pub fn draw_person_status(
    frame: &mut Mat,
    assignments: &[PersonAssignment],
) -> Result<(), DrawError> {
    for (i, r) in assignments.iter().enumerate() {
        let b = r.person.bbox;
        let color = if r.is_compliant() { green() } else { red() };
        imgproc::rectangle(
            frame,
            Rect::new(b.x1, b.y1, b.x2 - b.x1, b.y2 - b.y1),
            color,
            2,
            imgproc::LINE_8,
            0,
        )?;

        let status = if r.is_compliant() {
            format!("Person {}: OK", i + 1)
        } else {
            format!("Person {}: Missing: {}", i + 1, r.missing.join(", "))
        };
        imgproc::put_text(
            frame,
            &status,
            Point::new(b.x1, b.y1 - 10),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.7,
            color,
            2,
            imgproc::LINE_AA,
            false,
        )?;
    }
    Ok(())
}
