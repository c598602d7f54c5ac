//! Tests for glob expansion of input arguments.

use csvavro::io::glob::{expand_inputs, is_pattern};
use csvavro::testing::*;
use csvavro::{ConvertError, ConvertOptions, text_to_container};
use std::fs::create_dir_all;
use std::path::PathBuf;

#[test]
fn test_pattern_expands_sorted() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let b = write_text(dir.path(), "part-b.csv", "id\nx\n")?;
    let a = write_text(dir.path(), "part-a.csv", "id\nx\n")?;
    write_text(dir.path(), "notes.txt", "ignored")?;
    create_dir_all(dir.path().join("part-dir.csv"))?;

    let pattern = format!("{}/part-*.csv", dir.path().display());
    assert_eq!(expand_inputs(&[pattern])?, [a, b]);
    Ok(())
}

#[test]
fn test_literal_paths_pass_through_in_order() -> anyhow::Result<()> {
    let inputs = expand_inputs(&["z.csv", "a.csv"])?;
    assert_eq!(inputs, [PathBuf::from("z.csv"), PathBuf::from("a.csv")]);
    Ok(())
}

#[test]
fn test_unmatched_pattern_is_a_validation_error() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let pattern = format!("{}/*.csv", dir.path().display());
    let err = expand_inputs(&[pattern]).unwrap_err();
    assert!(matches!(err, ConvertError::Validation(_)), "{err}");
    assert!(is_pattern("data/[ab].csv"));
    assert!(!is_pattern("data/plain.csv"));
    Ok(())
}

#[test]
fn test_expanded_inputs_feed_one_container() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let data = dir.path().join("data");
    create_dir_all(&data)?;
    write_text(&data, "2.csv", "id,name\n3,c\n")?;
    write_text(&data, "1.csv", "id,name\n1,a\n2,b\n")?;

    let inputs = expand_inputs(&[format!("{}/*.csv", data.display())])?;
    let output = dir.path().join("all.avro");
    let summary = text_to_container(&inputs, &output, &ConvertOptions::new().with_header(true))?;
    assert_eq!(summary.files, 2);

    let (schema, records) = read_container(&output)?;
    assert_eq!(schema.name, "_1");
    let ids: Vec<_> = records.iter().filter_map(|r| r.get("id").cloned()).collect();
    assert_eq!(ids, [s("1"), s("2"), s("3")]);
    Ok(())
}
