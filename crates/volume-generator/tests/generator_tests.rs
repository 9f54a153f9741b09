//! End-to-end generation runs.

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use grid_common::{BoundingBox, GridSizing, IsoDuration, TimeInterval};
use test_utils::{
    assert_all_missing, assert_approx_eq, bbox, lattice_points, scattered_points,
    temp_test_dir_with_prefix, uniform_timestamps,
};
use volume_generator::{
    Aggregation, EncodedSlice, FixedSizer, GenerationSummary, GeneratorConfig, GeneratorError,
    Generator, NamedGroup, ProgressSink, RawFileWriter, Record, RecordSet, ResolutionSizer,
    SliceWriter, ValueType,
};

fn unit_sizer() -> FixedSizer {
    FixedSizer(GridSizing {
        x_size: 4,
        y_size: 4,
        origin_lon: 0.0,
        origin_lat: 0.0,
        step: 0.25,
    })
}

fn unit_config(duration: &str) -> GeneratorConfig {
    let (min_lat, max_lat, min_lon, max_lon) = bbox::UNIT;
    let mut config = GeneratorConfig::new(
        BoundingBox::new(min_lat, max_lat, min_lon, max_lon).unwrap(),
        100.0,
        "crimes",
        IsoDuration::parse(duration).unwrap(),
    );
    config.mercator_conversion = false;
    config
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2012, 8, 7, 0, 0, 0).unwrap()
}

/// Every cell center once per hour for `hours` hours, categorised by shift.
fn lattice_set(hours: usize) -> RecordSet {
    let points = lattice_points(0.0, 0.0, 0.25, 4, 4);
    let mut records = Vec::new();
    for (h, ts) in uniform_timestamps(t0(), Duration::hours(1), hours).into_iter().enumerate() {
        for (i, &(lon, lat)) in points.iter().enumerate() {
            let shift = if h < 12 { "day" } else { "night" };
            records.push(
                Record::new(ts + Duration::minutes(i as i64), lon, lat)
                    .with_weight((i + 1) as f64)
                    .with_categories([shift]),
            );
        }
    }
    RecordSet::from_records(vec!["category_shift".to_string()], records).unwrap()
}

#[derive(Default)]
struct RecordingSink {
    labels: Mutex<Vec<String>>,
    finished: Mutex<Option<usize>>,
}

impl ProgressSink for RecordingSink {
    fn on_subset(&self, label: &str, _slices: &[EncodedSlice]) {
        self.labels.lock().unwrap().push(label.to_string());
    }

    fn on_finish(&self, summary: &GenerationSummary) {
        *self.finished.lock().unwrap() = Some(summary.subsets.len());
    }
}

#[test]
fn test_count_run_over_lattice() {
    let generator = Generator::new(unit_config("PT1H"), &unit_sizer()).unwrap();
    let sink = RecordingSink::default();
    let summary = generator.generate_with(&lattice_set(24), &sink).unwrap();

    assert_eq!((summary.x_size, summary.y_size), (4, 4));
    assert_eq!(summary.subsets.len(), 2);
    assert_eq!(*sink.labels.lock().unwrap(), vec!["shift=day", "shift=night"]);
    assert_eq!(*sink.finished.lock().unwrap(), Some(2));

    for report in &summary.subsets {
        assert!(report.error.is_none());
        assert_eq!(report.records, 12 * 16);
        assert_eq!(report.slices.len(), 12);
        assert_eq!(report.min, Some(1.0));
        assert_eq!(report.max, Some(1.0));
        for slice in &report.slices {
            assert_eq!(slice.summary.defined_cells, 16);
            assert_eq!(slice.bytes.len(), 16 * 4);
            assert_eq!(slice.summary.metadata.slice_duration, "PT1H");
            assert_eq!(slice.summary.metadata.layer_id, "crimes");
        }
    }
}

#[test]
fn test_weighted_sum_marks_empty_cells_missing() {
    let mut config = unit_config("P1D");
    config.weight_function = Some(Aggregation::Sum);
    let generator = Generator::new(config, &unit_sizer()).unwrap();

    // Two weighted points in the bottom-left cell only
    let records = vec![
        Record::new(t0(), 0.1, 0.1).with_weight(2.0),
        Record::new(t0() + Duration::hours(1), 0.2, 0.2).with_weight(3.0),
    ];
    let set = RecordSet::from_records(Vec::new(), records).unwrap();
    let volume = generator.build_volume(&generator.prepare(&set).records).unwrap();

    assert_eq!(volume.len(), 1);
    let slice = volume.slices().next().unwrap();
    assert_eq!(slice.cells[0], 5.0);
    assert_all_missing!(slice.cells[1..]);
}

#[test]
fn test_int32_sum_keeps_zero_for_empty_cells() {
    let mut config = unit_config("P1D");
    config.weight_function = Some(Aggregation::Sum);
    config.value_type = ValueType::Int32;
    let generator = Generator::new(config, &unit_sizer()).unwrap();

    let set = RecordSet::from_records(
        Vec::new(),
        vec![Record::new(t0(), 0.9, 0.9).with_weight(2.7)],
    )
    .unwrap();
    let summary = generator.generate(&set).unwrap();
    let slice = &summary.subsets[0].slices[0];

    assert_eq!(slice.summary.defined_cells, 16);
    assert_eq!(slice.bytes.len(), 16 * 4);
    assert_eq!(&slice.bytes[15 * 4..], &2i32.to_le_bytes());
    assert_eq!(&slice.bytes[..4], &0i32.to_le_bytes());
}

#[test]
fn test_mean_of_constant_weights_is_exact() {
    let mut config = unit_config("P1D");
    config.weight_function = Some(Aggregation::Mean);
    config.value_type = ValueType::Float64;
    let generator = Generator::new(config, &unit_sizer()).unwrap();

    let records = (0..1000)
        .map(|i| Record::new(t0() + Duration::seconds(i), 0.6, 0.6).with_weight(0.1))
        .collect();
    let set = RecordSet::from_records(Vec::new(), records).unwrap();
    let volume = generator.build_volume(&set.records).unwrap();
    let cells = &volume.slices().next().unwrap().cells;

    assert_approx_eq!(cells[2 * 4 + 2], 0.1, 1e-12);
    assert_eq!(volume.slices().next().unwrap().defined_cells(), 1);
}

#[test]
fn test_out_of_grid_buckets_produce_no_slice() {
    let generator = Generator::new(unit_config("PT1H"), &unit_sizer()).unwrap();
    let records = vec![
        Record::new(t0(), 0.5, 0.5),
        Record::new(t0() + Duration::hours(1), 5.0, 5.0),
        Record::new(t0() + Duration::hours(2), 0.5, f64::NAN),
        Record::new(t0() + Duration::hours(3), 0.5, 0.5),
    ];
    let set = RecordSet::from_records(Vec::new(), records).unwrap();
    let volume = generator.build_volume(&set.records).unwrap();

    let starts: Vec<_> = volume.timestamps().cloned().collect();
    assert_eq!(starts, vec![t0(), t0() + Duration::hours(3)]);
}

#[test]
fn test_parallel_matches_sequential() {
    let set = lattice_set(24);
    let sequential = Generator::new(unit_config("PT30M"), &unit_sizer())
        .unwrap()
        .generate(&set)
        .unwrap();

    let mut config = unit_config("PT30M");
    config.parallel = true;
    let sink = RecordingSink::default();
    let parallel = Generator::new(config, &unit_sizer())
        .unwrap()
        .generate_with(&set, &sink)
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(*sink.labels.lock().unwrap(), vec!["shift=day", "shift=night"]);
}

#[test]
fn test_nonadditive_groups_run() {
    let mut config = unit_config("PT1H");
    config.additive = false;
    config.groups = vec![
        NamedGroup::new("nights").accepting("category_shift", ["night"]),
        NamedGroup::new("everything"),
    ];
    let generator = Generator::new(config, &unit_sizer()).unwrap();
    let summary = generator.generate(&lattice_set(24)).unwrap();

    let labels: Vec<&str> = summary.subsets.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["nights", "everything"]);
    assert_eq!(summary.subsets[0].records, 12 * 16);
    assert_eq!(summary.subsets[1].records, 24 * 16);
}

#[test]
fn test_default_nonadditive_groups() {
    let mut config = unit_config("PT1H");
    config.additive = false;
    let generator = Generator::new(config, &unit_sizer()).unwrap();
    let summary = generator.generate(&lattice_set(24)).unwrap();

    let labels: Vec<&str> = summary.subsets.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["all", "shift=day", "shift=night"]);
}

#[test]
fn test_empty_input_yields_no_subsets() {
    let generator = Generator::new(unit_config("PT1H"), &unit_sizer()).unwrap();
    let summary = generator.generate(&RecordSet::default()).unwrap();
    assert!(summary.subsets.is_empty());

    // Everything filtered out by the intervals
    let mut config = unit_config("PT1H");
    config.time_intervals =
        vec![TimeInterval::parse("1999-01-01T00:00:00Z", "1999-01-02T00:00:00Z").unwrap()];
    let generator = Generator::new(config, &unit_sizer()).unwrap();
    assert!(generator.generate(&lattice_set(2)).unwrap().subsets.is_empty());
}

#[test]
fn test_approximated_run_folds_days() {
    let mut config = unit_config("PT1H");
    config.approximated = true;
    let generator = Generator::new(config, &unit_sizer()).unwrap();

    let records = uniform_timestamps(t0() + Duration::hours(9), Duration::days(1), 20)
        .into_iter()
        .map(|ts| Record::new(ts, 0.5, 0.5))
        .collect();
    let set = RecordSet::from_records(Vec::new(), records).unwrap();
    let summary = generator.generate(&set).unwrap();

    let report = &summary.subsets[0];
    assert_eq!(report.label, "all");
    assert_eq!(report.slices.len(), 1);
    assert_eq!(
        report.slices[0].timestamp,
        Utc.with_ymd_and_hms(1970, 1, 2, 9, 0, 0).unwrap()
    );
    assert_eq!(report.max, Some(20.0));
}

#[test]
fn test_unknown_aggregation_is_rejected() {
    assert!(matches!(
        Aggregation::parse("median"),
        Err(GeneratorError::UnknownAggregation(_))
    ));
}

#[test]
fn test_denver_run_writes_raw_files() {
    let (min_lat, max_lat, min_lon, max_lon) = bbox::DENVER;
    let mut config = GeneratorConfig::new(
        BoundingBox::new(min_lat, max_lat, min_lon, max_lon).unwrap(),
        100.0,
        "denver",
        IsoDuration::parse("P1D").unwrap(),
    );
    config.resolution = Some((537, 681));

    let dir = temp_test_dir_with_prefix("denver");
    let generator = Generator::new(config, &ResolutionSizer)
        .unwrap()
        .with_writer(RawFileWriter::new(dir.path()));
    assert!(generator.grid().min_lat > min_lat);

    let points = scattered_points((min_lon, max_lon), (min_lat, max_lat), 240, 11);
    let records = uniform_timestamps(t0(), Duration::minutes(18), 240)
        .into_iter()
        .zip(points)
        .map(|(ts, (lon, lat))| Record::new(ts, lon, lat))
        .collect();
    let set = RecordSet::from_records(Vec::new(), records).unwrap();
    let summary = generator.generate(&set).unwrap();

    let report = &summary.subsets[0];
    assert!(report.error.is_none());
    assert_eq!(report.slices.len(), 3);

    let mut total = 0.0;
    for slice in &report.slices {
        let path = RawFileWriter::new(dir.path())
            .slice_path("denver", "all", &slice.timestamp)
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 537 * 681 * 4);
        assert_eq!(&bytes[..], &slice.bytes[..]);
        total += bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
            .sum::<f64>();
    }
    assert_eq!(total, 240.0);
}

struct RefusingWriter;

impl SliceWriter for RefusingWriter {
    fn write(
        &self,
        _cells: &[f64],
        _value_type: ValueType,
        _layer_id: &str,
        subset_label: &str,
        _timestamp: &DateTime<Utc>,
    ) -> volume_generator::Result<()> {
        if subset_label.contains("night") {
            return Err(GeneratorError::Write(format!("{} is read-only", subset_label)));
        }
        Ok(())
    }
}

#[test]
fn test_failed_subset_does_not_stop_siblings() {
    let generator = Generator::new(unit_config("PT1H"), &unit_sizer())
        .unwrap()
        .with_writer(RefusingWriter);
    let summary = generator.generate(&lattice_set(24)).unwrap();

    assert_eq!(summary.subsets.len(), 2);
    let failures: Vec<&str> = summary.failures().map(|s| s.label.as_str()).collect();
    assert_eq!(failures, vec!["shift=night"]);
    assert_eq!(summary.subsets[0].slices.len(), 12);
    assert!(summary.subsets[1]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("read-only")));
}

#[test]
fn test_labels_from_data_cannot_leave_the_output_root() {
    let dir = temp_test_dir_with_prefix("labels");
    let root = dir.path().join("out");

    let records = vec![
        Record::new(t0(), 0.5, 0.5).with_categories(["../../escaped"]),
        Record::new(t0(), 0.5, 0.5).with_categories(["theft"]),
    ];
    let set = RecordSet::from_records(vec!["category_type".to_string()], records).unwrap();

    let generator = Generator::new(unit_config("PT1H"), &unit_sizer())
        .unwrap()
        .with_writer(RawFileWriter::new(&root));
    let summary = generator.generate(&set).unwrap();

    assert_eq!(summary.failures().count(), 0);
    assert_eq!(summary.subsets[0].label, "type=..%2F..%2Fescaped");
    assert!(root
        .join("crimes")
        .join("type=..%2F..%2Fescaped")
        .join("20120807T000000Z.raw")
        .is_file());
    assert!(!dir.path().join("escaped").exists());

    // A configured group name with a parent step fails alone
    let mut config = unit_config("PT1H");
    config.additive = false;
    config.groups = vec![NamedGroup::new("../evil"), NamedGroup::new("everything")];
    let generator = Generator::new(config, &unit_sizer())
        .unwrap()
        .with_writer(RawFileWriter::new(&root));
    let summary = generator.generate(&set).unwrap();

    let failures: Vec<&str> = summary.failures().map(|s| s.label.as_str()).collect();
    assert_eq!(failures, vec!["../evil"]);
    assert_eq!(summary.subsets[1].slices.len(), 1);
    assert!(!dir.path().join("evil").exists());
}
