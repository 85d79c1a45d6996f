use super::*;

#[test]
fn frame_range_contains_boundaries_and_step() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(8), 3).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(!r.contains(FrameIndex(3)));
    assert!(r.contains(FrameIndex(5)));
    assert!(r.contains(FrameIndex(8)));
    assert!(!r.contains(FrameIndex(9)));
}

#[test]
fn frame_range_iter_is_inclusive() {
    let r = FrameRange::new(FrameIndex(-1), FrameIndex(3), 2).unwrap();
    let frames: Vec<_> = r.iter().collect();
    assert_eq!(frames, vec![FrameIndex(-1), FrameIndex(1), FrameIndex(3)]);
    assert_eq!(r.len_frames(), 3);

    let single = FrameRange::single(FrameIndex(7));
    assert_eq!(single.iter().collect::<Vec<_>>(), vec![FrameIndex(7)]);
    assert_eq!(single.len_frames(), 1);
}

#[test]
fn frame_range_rejects_inverted_or_zero_step() {
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(4), 1).is_err());
    assert!(FrameRange::new(FrameIndex(0), FrameIndex(4), 0).is_err());
}

#[test]
fn resolution_percentage_rounds() {
    let r = Resolution::scaled(1920, 1080, 50);
    assert_eq!(r, Resolution::new(960, 540));
    let r = Resolution::scaled(101, 51, 50);
    assert_eq!(r, Resolution::new(51, 26));
}

#[test]
fn subframe_time_as_f64() {
    let t = SubframeTime::new(FrameIndex(10), 0.25);
    assert_eq!(t.as_f64(), 10.25);
    let t = SubframeTime::new(FrameIndex(-3), 0.5);
    assert_eq!(t.as_f64(), -2.5);
}

#[test]
fn buffer_shape_len_and_display() {
    let s = BufferShape::rgba(Resolution::new(3, 2));
    assert_eq!(s.sample_len(), Some(24));
    assert_eq!(s.to_string(), "3x2x4");
    assert_eq!(BufferShape::new(u32::MAX, u32::MAX, u32::MAX).sample_len(), None);
}
