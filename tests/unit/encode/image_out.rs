use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shutterblur_{name}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 1x2 image: bottom row red (over-range), top row half gray.
fn two_rows() -> PixelBuffer {
    PixelBuffer::from_vec(
        BufferShape::new(1, 2, 4),
        vec![2.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 1.0],
    )
    .unwrap()
}

#[test]
fn output_path_pads_frame_numbers() {
    assert_eq!(
        frame_output_path("renders/shot_", FrameIndex(12), OutputFormat::OpenExr),
        PathBuf::from("renders/shot_0012.exr")
    );
    assert_eq!(
        frame_output_path("out/", FrameIndex(12345), OutputFormat::Png8),
        PathBuf::from("out/12345.png")
    );
    assert_eq!(
        frame_output_path("f", FrameIndex(-3), OutputFormat::Png16),
        PathBuf::from("f-003.png")
    );
}

#[test]
fn png8_flips_rows_and_clamps() {
    let dir = scratch_dir("png8");
    let path = dir.join("nested").join("0001.png");
    save_pixel_buffer(&two_rows(), &path, OutputFormat::Png8).unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (1, 2));
    // file row 0 is the top of the frame
    assert_eq!(img.get_pixel(0, 0).0, [128, 128, 128, 255]);
    assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
}

#[test]
fn png16_keeps_precision() {
    let dir = scratch_dir("png16");
    let path = dir.join("0001.png");
    save_pixel_buffer(&two_rows(), &path, OutputFormat::Png16).unwrap();

    let img = image::open(&path).unwrap().to_rgba16();
    assert_eq!(img.get_pixel(0, 0).0, [32768, 32768, 32768, 65535]);
    assert_eq!(img.get_pixel(0, 1).0, [65535, 0, 0, 65535]);
}

#[test]
fn exr_stores_unclamped_values() {
    let dir = scratch_dir("exr");
    let path = dir.join("0001.exr");
    save_pixel_buffer(&two_rows(), &path, OutputFormat::OpenExr).unwrap();

    let img = image::open(&path).unwrap().to_rgba32f();
    assert_eq!(img.get_pixel(0, 1).0, [2.0, 0.0, 0.0, 1.0]);
    assert_eq!(img.get_pixel(0, 0).0, [0.5, 0.5, 0.5, 1.0]);
}

#[test]
fn non_rgba_buffers_are_rejected() {
    let buf = PixelBuffer::from_vec(BufferShape::new(1, 1, 3), vec![0.0; 3]).unwrap();
    let dir = scratch_dir("rgb");
    assert!(save_pixel_buffer(&buf, &dir.join("x.png"), OutputFormat::Png8).is_err());
}
