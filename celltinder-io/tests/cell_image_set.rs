use approx::assert_relative_eq;
use celltinder_core::{Centroid, CropConfig};
use celltinder_io::{frame_path, CellImageSet, CellTable, Error, FrameLayout, FrameRole};
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};

fn write_gray16(path: &Path, width: u32, height: u32, data: &[u16]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    encoder
        .write_image::<colortype::Gray16>(width, height, data)
        .unwrap();
}

/// Writes a 10×10 field `A1_01` with sequential image values and a mask
/// holding labels 1 (left half) and 2 (right half), for frames `1..=n`.
fn write_field(root: &Path, config: &CropConfig, n: u32) -> FrameLayout {
    let layout = FrameLayout::new(root, &config.image_label, &config.mask_label, "tif");
    let image: Vec<u16> = (0..100).collect();
    let mask: Vec<u16> = (0..100).map(|i| if i % 10 < 5 { 1 } else { 2 }).collect();
    for frame in 1..=n {
        let offset: Vec<u16> = image.iter().map(|v| v + (frame as u16 - 1) * 100).collect();
        write_gray16(&frame_path(&layout.image_base("A1_01"), frame), 10, 10, &offset);
        write_gray16(&frame_path(&layout.mask_base("A1_01"), frame), 10, 10, &mask);
    }
    layout
}

#[test]
fn test_build_pads_crop_near_corner() {
    let dir = TempDir::new().unwrap();
    let config = CropConfig::new().with_crop_size(8).with_n_frames(2);
    let layout = write_field(dir.path(), &config, 2);

    let set = CellImageSet::build(
        Centroid::new(2.0, 2.0),
        &layout.image_base("A1_01"),
        &layout.mask_base("A1_01"),
        1,
        &config,
    )
    .unwrap();

    assert_eq!(set.len(), 2);
    let first = set.image(1).unwrap();
    assert_eq!(first.dim(), (8, 8));
    assert!(first.row(0).iter().all(|&v| v == 0.0));
    assert!(first.column(1).iter().all(|&v| v == 0.0));
    assert_eq!(first[[2, 2]], 0.0);
    assert_relative_eq!(first[[2, 3]], 1.0);
    assert_relative_eq!(first[[7, 7]], 55.0);

    let second = set.image(2).unwrap();
    assert_relative_eq!(second[[7, 7]], 155.0);

    let mask = set.mask(1).unwrap();
    assert_eq!(mask.dim(), (8, 8));
    assert_eq!(mask[[2, 2]], 1);
    assert_eq!(mask[[2, 7]], 2);
    assert!(set.image(3).is_none());
}

#[test]
fn test_build_isolates_mask_label() {
    let dir = TempDir::new().unwrap();
    let config = CropConfig::new()
        .with_crop_size(8)
        .with_n_frames(1)
        .with_isolate_masks(true);
    let layout = write_field(dir.path(), &config, 1);

    let set = CellImageSet::build(
        Centroid::new(5.0, 5.0),
        &layout.image_base("A1_01"),
        &layout.mask_base("A1_01"),
        2,
        &config,
    )
    .unwrap();

    let mask = set.mask(1).unwrap();
    assert!(mask.iter().all(|&v| v == 0 || v == 2));
    assert_eq!(mask[[4, 4]], 0);
    assert_eq!(mask[[4, 5]], 2);
}

#[test]
fn test_build_reports_missing_frame() {
    let dir = TempDir::new().unwrap();
    let config = CropConfig::new().with_crop_size(8).with_n_frames(3);
    let layout = write_field(dir.path(), &config, 2);

    let err = CellImageSet::build(
        Centroid::new(5.0, 5.0),
        &layout.image_base("A1_01"),
        &layout.mask_base("A1_01"),
        1,
        &config,
    )
    .unwrap_err();

    assert!(err.is_not_found());
    match err {
        Error::Frame { role, frame, .. } => {
            assert_eq!(role, FrameRole::Image);
            assert_eq!(frame, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_table_drives_layout() {
    let dir = TempDir::new().unwrap();
    let config = CropConfig::new().with_crop_size(4).with_n_frames(1);
    write_field(dir.path(), &config, 1);

    let table_path = dir.path().join("cells.csv");
    std::fs::write(
        &table_path,
        "fov_ID,cell_numb,centroid-0,centroid-1,ratio\nA1_01,2,5.5,7.9,0.8\n",
    )
    .unwrap();
    let table = CellTable::read_csv(&table_path).unwrap();
    let field = table.text_at(0, "fov_ID").unwrap().to_string();
    let label = u32::try_from(table.integer_at(0, "cell_numb").unwrap()).unwrap();
    let centroid = Centroid::new(
        table.float_at(0, "centroid-0").unwrap(),
        table.float_at(0, "centroid-1").unwrap(),
    );

    let layout = FrameLayout::for_table(&table_path, &config);
    let set = CellImageSet::build(
        centroid,
        &layout.image_base(&field),
        &layout.mask_base(&field),
        label,
        &config,
    )
    .unwrap();

    // Window rows 3..7, cols 5..9.
    let image = set.image(1).unwrap();
    assert_relative_eq!(image[[0, 0]], 35.0);
    assert_relative_eq!(image[[3, 3]], 68.0);
    assert!(set.mask(1).unwrap().iter().all(|&v| v == 2));
}
