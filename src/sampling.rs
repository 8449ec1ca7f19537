/// Frame-skip cadence: run the detector only on every `stride`-th frame.
/// The caller reuses the previous cycle's output when this returns false.
/// `stride` is validated to be at least 1 at configuration load.
pub fn should_run_detection(frame_index: u64, stride: u64) -> bool {
    frame_index % stride == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_five() {
        let triggered: Vec<u64> = (0..16).filter(|&i| should_run_detection(i, 5)).collect();
        assert_eq!(triggered, vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_stride_one_always_runs() {
        assert!((0..100).all(|i| should_run_detection(i, 1)));
    }

    #[test]
    fn test_first_frame_always_runs() {
        for stride in [1, 2, 7, 30] {
            assert!(should_run_detection(0, stride));
        }
    }
}
