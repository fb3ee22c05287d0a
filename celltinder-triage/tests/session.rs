use approx::assert_relative_eq;
use celltinder_core::{CropConfig, TableSchema, TriageConfig};
use celltinder_io::{frame_path, CellTable, FrameLayout};
use celltinder_triage::{Error, ThresholdTable, TriageSession};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};

const CELLS: &str = "\
ratio,centroid_y,centroid_x,fov_ID,cell_numb
0.1,2,2,A1_01,1
0.5,5,5,A1_01,2
0.8,7,3,A2_01,1
";

fn write_table(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("cells.csv");
    std::fs::write(&path, text).unwrap();
    path
}

fn write_frame(path: &Path, data: &[u16]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    encoder
        .write_image::<colortype::Gray16>(10, 10, data)
        .unwrap();
}

fn write_frames(root: &Path, field_id: &str, config: &CropConfig) {
    let layout = FrameLayout::new(root, &config.image_label, &config.mask_label, "tif");
    let image: Vec<u16> = (0..100).collect();
    let mask: Vec<u16> = (0..100).map(|i| if i < 50 { 1 } else { 2 }).collect();
    for frame in 1..=config.n_frames {
        write_frame(&frame_path(&layout.image_base(field_id), frame), &image);
        write_frame(&frame_path(&layout.mask_base(field_id), frame), &mask);
    }
}

fn small_config() -> TriageConfig {
    TriageConfig::new().with_crop(CropConfig::new().with_crop_size(4).with_n_frames(2))
}

#[test]
fn test_window_scenario() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    let mut session = TriageSession::open(&path, small_config()).unwrap();

    assert_eq!(session.get_default_bounds(), (0.1, 0.8));
    assert_eq!(session.get_count(0.3, 0.9), 2);
    assert_eq!(session.get_count(0.1, 0.8), 3);

    let column = session.commit_window(0.3, 0.9).unwrap();
    assert_eq!(column, "0.3 < x < 0.9");
    let ratios: Vec<f64> = session
        .get_active_subset()
        .unwrap()
        .iter()
        .map(|r| r.ratio)
        .collect();
    assert_eq!(ratios, vec![0.8, 0.5]);
    assert_eq!(session.subset_len(), 2);
}

#[test]
fn test_get_count_clamps_inverted_window() {
    let dir = TempDir::new().unwrap();
    let session = TriageSession::open(&write_table(&dir, CELLS), small_config()).unwrap();
    // (0.5, 0.1) becomes (0.5, 0.51).
    assert_eq!(session.get_count(0.5, 0.1), 1);
}

#[test]
fn test_active_subset_before_commit() {
    let dir = TempDir::new().unwrap();
    let mut session = TriageSession::open(&write_table(&dir, CELLS), small_config()).unwrap();
    assert!(session.get_active_subset().unwrap_err().is_invalid_state());
    assert!(session.begin_triage().unwrap_err().is_invalid_state());
    assert!(session.mark_kept(0, true).unwrap_err().is_invalid_state());
}

#[test]
fn test_window_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    {
        let mut table = ThresholdTable::open(&path, TableSchema::default()).unwrap();
        table.commit_window(0.05, 0.3).unwrap();
        table.commit_window(0.25, 0.75).unwrap();
    }

    let table = ThresholdTable::open(&path, TableSchema::default()).unwrap();
    assert_eq!(table.active_column(), Some("0.25 < x < 0.75"));
    let (lower, upper) = table.window().bounds();
    assert_relative_eq!(lower, 0.25);
    assert_relative_eq!(upper, 0.75);

    let thresholds: Vec<&str> = table
        .table()
        .column_names()
        .filter(|name| name.contains("< x <"))
        .collect();
    assert_eq!(thresholds, vec!["0.25 < x < 0.75"]);
    assert_eq!(table.active_rows().unwrap(), vec![1]);
}

#[test]
fn test_marks_survive_reload() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    let mut session = TriageSession::open(&path, small_config()).unwrap();
    session.commit_window(0.3, 0.9).unwrap();
    session.mark_kept(1, true).unwrap();
    assert_eq!(session.selected_count(), 1);
    assert_eq!(session.commit_selection().unwrap(), 1);

    let reloaded = CellTable::read_csv(&path).unwrap();
    assert_eq!(reloaded.flags("kept").unwrap(), &[false, true, false]);

    let mut session = TriageSession::open(&path, small_config()).unwrap();
    assert_eq!(session.begin_triage().unwrap(), 2);
    assert_eq!(session.selected_count(), 1);
    assert_eq!(session.cell_record(1).unwrap().kept, Some(true));
    assert_eq!(session.cell_record(0).unwrap().kept, Some(false));
}

#[test]
fn test_uncommitted_marks_are_not_written() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    let mut session = TriageSession::open(&path, small_config()).unwrap();
    session.commit_window(0.3, 0.9).unwrap();
    session.mark_kept(0, true).unwrap();
    drop(session);

    let reloaded = CellTable::read_csv(&path).unwrap();
    assert!(!reloaded.has_column("kept"));
}

#[test]
fn test_navigation_wraps() {
    let dir = TempDir::new().unwrap();
    let mut session = TriageSession::open(&write_table(&dir, CELLS), small_config()).unwrap();
    session.commit_window(0.0, 1.0).unwrap();
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.previous_cell(), 2);
    assert_eq!(session.next_cell(), 0);
    assert_eq!(session.jump_to(1).unwrap(), 1);
    assert_eq!(session.jump_to(3).unwrap(), 0);
    assert_eq!(session.current_index(), 0);
}

#[test]
fn test_cell_image_set_for_subset_index() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    let config = small_config();
    write_frames(dir.path(), "A1_01", &config.crop);

    let mut session = TriageSession::open(&path, config).unwrap();
    session.commit_window(0.0, 1.0).unwrap();

    // Index 1 is ratio 0.5 at (5, 5), label 2: window rows and cols 3..7.
    let set = session.get_cell_image_set(1).unwrap();
    assert_eq!(set.len(), 2);
    let image = set.image(2).unwrap();
    assert_eq!(image.dim(), (4, 4));
    assert_relative_eq!(image[[0, 0]], 33.0);
    assert_relative_eq!(image[[3, 3]], 66.0);
    assert_eq!(set.mask(1).unwrap()[[3, 0]], 2);
}

#[test]
fn test_cell_load_error_names_the_cell() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    let config = small_config();
    write_frames(dir.path(), "A1_01", &config.crop);

    let mut session = TriageSession::open(&path, config).unwrap();
    session.commit_window(0.0, 1.0).unwrap();

    // Index 0 is ratio 0.8 in field A2_01, whose frames do not exist.
    let err = session.get_cell_image_set(0).unwrap_err();
    match err {
        Error::CellLoad {
            index,
            field_id,
            mask_label,
            source,
        } => {
            assert_eq!(index, 0);
            assert_eq!(field_id, "A2_01");
            assert_eq!(mask_label, 1);
            assert!(source.is_not_found());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_custom_flag_column() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, CELLS);
    let config = TriageConfig::new().with_schema(TableSchema::default().with_flag("process"));
    let mut session = TriageSession::open(&path, config).unwrap();
    session.commit_window(0.3, 0.9).unwrap();
    session.mark_kept(0, true).unwrap();
    session.commit_selection().unwrap();

    let reloaded = CellTable::read_csv(&path).unwrap();
    assert_eq!(reloaded.flags("process").unwrap(), &[false, false, true]);
}

#[test]
fn test_cell_without_centroid_is_not_cropped() {
    let dir = TempDir::new().unwrap();
    let text = "\
ratio,centroid_y,centroid_x,fov_ID,cell_numb
0.5,,5,A1_01,2
";
    let path = write_table(&dir, text);
    let config = small_config();
    write_frames(dir.path(), "A1_01", &config.crop);

    let mut session = TriageSession::open(&path, config).unwrap();
    session.commit_window(0.0, 1.0).unwrap();
    let err = session.get_cell_image_set(0).unwrap_err();
    assert!(matches!(
        err,
        Error::IoError(celltinder_io::Error::InvalidValue { row: 0, .. })
    ));
    assert!(session.cell_record(0).is_err());
}
