//! Integration tests for dataset persistence.
//!
//! Datasets are written to store files through [`tempfile`] and read back, checking that
//! values, metadata and the sharing between arrays survive the round trip.

use obsdata::{prelude::*, store::codec};
use std::fs;
use tempfile::NamedTempFile;

fn factory_dataset() -> Dataset {
    let mut dataset = Dataset::new(3);
    dataset
        .add(
            "time_delta",
            "time",
            FieldValue::Floats(vec![0.0, 0.5, 1.0]),
            FieldConfig::new().with_scale("tai").with_fmt("hours"),
        )
        .unwrap();
    let time = dataset.field("time").unwrap().data().clone();

    dataset
        .add(
            "position",
            "site_pos",
            FieldValue::Positions(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]),
            FieldConfig::new()
                .with_system("trs")
                .with_time(time)
                .with_unit("meter"),
        )
        .unwrap();
    dataset
        .add(
            "text",
            "station",
            FieldValue::Text(vec!["osls".into(), "trds".into(), "osls".into()]),
            FieldConfig::new().with_description("station identifier"),
        )
        .unwrap();
    dataset
        .add(
            "bool",
            "outlier",
            FieldValue::Bools(vec![false, true, false]),
            FieldConfig::new().with_write_level(WriteLevel::Analysis),
        )
        .unwrap();
    dataset
        .add(
            "float",
            "covariance",
            FieldValue::Rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]),
            FieldConfig::new().with_write_level(WriteLevel::Detail),
        )
        .unwrap();
    dataset.add_shared("epoch", "time").unwrap();
    dataset
}

fn roundtrip(dataset: &Dataset) -> Dataset {
    let file = NamedTempFile::new().unwrap();
    dataset.write_to_file(file.path()).unwrap();
    Dataset::from_file(file.path()).unwrap()
}

#[test]
fn test_roundtrip_values_and_metadata() {
    let dataset = factory_dataset();
    let read = roundtrip(&dataset);

    assert_eq!(read.num_obs(), 3);
    assert_eq!(read.field_names(), dataset.field_names());
    for field in dataset.fields() {
        let other = read.field(field.name()).unwrap();
        assert_eq!(other.tag(), field.tag());
        assert_eq!(other.num_obs(), field.num_obs());
        assert_eq!(other.unit(), field.unit());
        assert_eq!(other.core().write_level(), field.core().write_level());
        assert_eq!(other.core().description(), field.core().description());
        assert_eq!(other.data(), field.data(), "values of '{}'", field.name());
    }

    let time = read.field("time").unwrap().data();
    let array = time.downcast::<TimeDeltaArray>().unwrap();
    assert_eq!(array.scale(), TimeScale::Tai);
    assert_eq!(array.fmt(), TimeFormat::Hours);
    assert_eq!(array.seconds(), &[0.0, 1800.0, 3600.0]);
}

#[test]
fn test_roundtrip_keeps_sharing() {
    let read = roundtrip(&factory_dataset());

    let time = read.field("time").unwrap().data();
    let epoch = read.field("epoch").unwrap().data();
    assert!(time.same_array(epoch), "shared fields must share one array");

    let positions = read.field("site_pos").unwrap().data();
    let nested = positions
        .downcast::<PositionArray>()
        .and_then(PositionArray::time)
        .unwrap();
    assert!(nested.same_array(time), "nested time must alias the time field");
}

#[test]
fn test_shared_array_written_once() {
    let dataset = factory_dataset();
    let mut root = Group::new();
    dataset.write(&mut root, WriteLevel::Detail).unwrap();

    let time = root.group("time").unwrap();
    assert!(time.attr("reference").is_none());
    assert!(time.data("seconds").is_ok());

    let nested = root.group("site_pos").unwrap().group("time").unwrap();
    assert_eq!(nested.attr_str("fieldname").unwrap(), "site_pos.time");
    assert_eq!(nested.attr_str("reference").unwrap(), "time");
    assert!(nested.data("seconds").is_err());

    let epoch = root.group("epoch").unwrap();
    assert_eq!(epoch.attr_str("reference").unwrap(), "time");
    assert!(epoch.data("seconds").is_err());
}

#[test]
fn test_mutate_after_read() {
    let mut read = roundtrip(&factory_dataset());
    read.subset(&[2, 0]).unwrap();
    read.append_empty(1).unwrap();

    let time = read.field("time").unwrap().data();
    assert!(time.same_array(read.field("epoch").unwrap().data()));
    assert_eq!(
        time.downcast::<TimeDeltaArray>().unwrap().seconds(),
        &[3600.0, 0.0, 0.0]
    );

    let reread = roundtrip(&read);
    assert_eq!(reread.num_obs(), 3);
    assert_eq!(
        reread.plot_values("station").unwrap(),
        PlotValues::Text(vec!["osls".into(), "osls".into(), String::new()])
    );
}

#[test]
fn test_write_level_operational() {
    let dataset = factory_dataset();
    let file = NamedTempFile::new().unwrap();
    let mut strict = Dataset::with_config(dataset.num_obs(), DatasetConfig::strict());
    for field in dataset.fields() {
        strict
            .add(
                field.tag(),
                field.name(),
                FieldValue::Array(field.data().clone()),
                field.core().config(),
            )
            .unwrap();
    }

    strict.write_to_file(file.path()).unwrap();
    let read = Dataset::from_file(file.path()).unwrap();
    assert_eq!(
        read.field_names(),
        vec!["time", "site_pos", "station", "epoch"]
    );
}

#[test]
fn test_corrupted_file() {
    let file = NamedTempFile::new().unwrap();
    factory_dataset().write_to_file(file.path()).unwrap();

    let mut bytes = fs::read(file.path()).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(file.path(), &bytes).unwrap();

    assert!(matches!(
        Dataset::from_file(file.path()),
        Err(Error::Malformed { .. })
    ));
    assert!(matches!(codec::decode(&bytes), Err(Error::Malformed { .. })));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Dataset::from_file(dir.path().join("absent.obsd"));
    assert!(matches!(result, Err(Error::FileError(_))));
}
