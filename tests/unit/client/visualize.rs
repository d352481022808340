use super::*;

#[test]
fn segmentation_palette_follows_id_bits() {
    let img = segmentation_to_rgb(&[0, 1, 2, 5], 2, 2).unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0]);
    assert_eq!(img.get_pixel(0, 1).0, [0, 255, 0]);
    assert_eq!(img.get_pixel(1, 1).0, [255, 0, 255]);
}

#[test]
fn segmentation_rejects_eight_or_more_categories() {
    let err = segmentation_to_rgb(&[7], 1, 1).unwrap_err();
    assert!(err.to_string().contains("got 8"));
    assert!(segmentation_to_rgb(&[6], 1, 1).is_ok());
}

#[test]
fn depth_and_normals_scale_to_bytes() {
    let depth = depth_to_rgb(&[0.0, 5.0, 20.0], 3, 1, 10.0).unwrap();
    assert_eq!(depth.get_pixel(1, 0).0, [127, 127, 127]);
    assert_eq!(depth.get_pixel(2, 0).0, [255, 255, 255]);
    assert!(depth_to_rgb(&[1.0], 1, 1, 0.0).is_err());

    let normals = normals_to_rgb(&[0.0, 0.5, 1.0], 1, 1).unwrap();
    assert_eq!(normals.get_pixel(0, 0).0, [0, 127, 255]);
}

#[test]
fn color_image_checks_buffer_size() {
    assert!(color_image(&[0; 12], 2, 2, 3).is_ok());
    assert!(matches!(
        color_image(&[0; 16], 2, 2, 4).unwrap(),
        DynamicImage::ImageRgba8(_)
    ));
    assert!(color_image(&[0; 11], 2, 2, 3).is_err());
    assert!(color_image(&[0; 8], 2, 2, 2).is_err());
}
