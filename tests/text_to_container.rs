//! Integration tests for converting delimited text into containers.

use csvavro::testing::*;
use csvavro::{
    ConversionError, ConversionSummary, ConvertError, ConvertOptions, PrimitiveType, Value,
    text_to_container,
};

#[test]
fn test_inferred_schema_from_header() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "people.csv", "id,name,amount\n1,Ada,10.5\n2,Bob,3\n")?;
    let output = dir.path().join("people.avro");

    let summary = text_to_container(&[input], &output, &ConvertOptions::new())?;
    assert_eq!(summary, ConversionSummary { files: 1, records: 2 });

    let (schema, records) = read_container(&output)?;
    assert_eq!(schema.name, "people");
    assert_eq!(schema.field_names().collect::<Vec<_>>(), ["id", "name", "amount"]);
    assert!(schema.fields.iter().all(|f| f.ty == PrimitiveType::String));
    assert_records_equal(
        &records,
        &[
            record(&[("id", s("1")), ("name", s("Ada")), ("amount", s("10.5"))]),
            record(&[("id", s("2")), ("name", s("Bob")), ("amount", s("3"))]),
        ],
    );
    Ok(())
}

#[test]
fn test_explicit_typed_schema() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "people.csv", "id,name,amount\n1,Ada,10.5\n2,Bob,3\n")?;
    let schema_path = write_text(
        dir.path(),
        "person.avsc",
        &typed_schema_text(
            "Person",
            &[
                ("id", PrimitiveType::Int),
                ("name", PrimitiveType::String),
                ("amount", PrimitiveType::Double),
            ],
        ),
    )?;
    let output = dir.path().join("people.avro");

    text_to_container(&[input], &output, &ConvertOptions::new().with_schema(&schema_path))?;

    let (schema, records) = read_container(&output)?;
    assert_eq!(schema.name, "Person");
    assert_records_equal(
        &records,
        &[
            record(&[("id", Value::Int(1)), ("name", s("Ada")), ("amount", Value::Double(10.5))]),
            record(&[("id", Value::Int(2)), ("name", s("Bob")), ("amount", Value::Double(3.0))]),
        ],
    );
    Ok(())
}

#[test]
fn test_record_name_option_overrides() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "2024-people.csv", "id,name\n1,Ada\n")?;

    let inferred = dir.path().join("inferred.avro");
    text_to_container(&[input.clone()], &inferred, &ConvertOptions::new())?;
    assert_eq!(read_container(&inferred)?.0.name, "_2024_people");

    let named = dir.path().join("named.avro");
    text_to_container(&[input], &named, &ConvertOptions::new().with_record_name("Person"))?;
    assert_eq!(read_container(&named)?.0.name, "Person");
    Ok(())
}

#[test]
fn test_multiple_inputs_keep_order() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let a = write_text(dir.path(), "a.csv", "id,name\n1,a\n2,b\n3,c\n")?;
    let b = write_text(dir.path(), "b.csv", "id,name\n4,d\n5,e\n6,f\n7,g\n")?;
    let output = dir.path().join("all.avro");

    let summary = text_to_container(&[a, b], &output, &ConvertOptions::new())?;
    assert_eq!(summary, ConversionSummary { files: 2, records: 7 });

    let (_, records) = read_container(&output)?;
    let ids: Vec<_> = records.iter().map(|r| r.get("id").cloned()).collect();
    let expected: Vec<_> = (1..=7).map(|i| Some(s(&i.to_string()))).collect();
    assert_eq!(ids, expected);
    Ok(())
}

#[test]
fn test_no_header_and_no_schema_is_a_schema_error() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "rows.csv", "1,Ada\n2,Bob\n")?;
    let output = dir.path().join("rows.avro");

    let err = text_to_container(&[input], &output, &ConvertOptions::new()).unwrap_err();
    assert!(matches!(err, ConvertError::Schema(_)), "{err}");
    Ok(())
}

#[test]
fn test_headerless_input_with_schema() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "rows.csv", "1,Ada\n2,Bob\n")?;
    let schema_path = write_text(
        dir.path(),
        "row.avsc",
        &typed_schema_text("Row", &[("id", PrimitiveType::Long), ("name", PrimitiveType::String)]),
    )?;
    let output = dir.path().join("rows.avro");

    let opts = ConvertOptions::new()
        .with_schema(&schema_path)
        .with_header(false);
    let summary = text_to_container(&[input], &output, &opts)?;
    assert_eq!(summary.records, 2);

    let (_, records) = read_container(&output)?;
    assert_eq!(records[0].get("id"), Some(&Value::Long(1)));
    Ok(())
}

#[test]
fn test_default_replaces_bad_cell() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "counts.csv", "id,n\n1,abc\n2,5\n")?;
    let schema_path = write_text(
        dir.path(),
        "counts.avsc",
        r#"{"type": "record", "name": "Count", "fields": [
            {"name": "id", "type": "int"},
            {"name": "n", "type": "int", "default": 0}
        ]}"#,
    )?;
    let output = dir.path().join("counts.avro");

    let opts = ConvertOptions::new()
        .with_schema(&schema_path)
        .with_header(true);
    text_to_container(&[input], &output, &opts)?;

    let (_, records) = read_container(&output)?;
    assert_records_equal(
        &records,
        &[
            record(&[("id", Value::Int(1)), ("n", Value::Int(0))]),
            record(&[("id", Value::Int(2)), ("n", Value::Int(5))]),
        ],
    );
    Ok(())
}

#[test]
fn test_bad_cell_without_default_reports_file_and_line() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "counts.csv", "id,n\n1,2\n3,abc\n")?;
    let schema_path = write_text(
        dir.path(),
        "counts.avsc",
        &typed_schema_text("Count", &[("id", PrimitiveType::Int), ("n", PrimitiveType::Int)]),
    )?;
    let output = dir.path().join("counts.avro");

    let opts = ConvertOptions::new()
        .with_schema(&schema_path)
        .with_header(true);
    let err = text_to_container(&[input.clone()], &output, &opts).unwrap_err();
    match err {
        ConvertError::Conversion { path, line, source } => {
            assert_eq!(path, input);
            assert_eq!(line, 3);
            assert!(
                matches!(source, ConversionError::Field { index: 1, ref field, .. } if field == "n")
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_short_row_is_a_column_count_error() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "ragged.csv", "a,b\n1,2\n3\n")?;
    let output = dir.path().join("ragged.avro");

    let opts = ConvertOptions::new().with_header(true);
    let err = text_to_container(&[input], &output, &opts).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Conversion {
            line: 3,
            source: ConversionError::ColumnCount {
                expected: 2,
                found: 1
            },
            ..
        }
    ));
    Ok(())
}

#[test]
fn test_explicit_tab_delimiter() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "people.tsv", "id\tname\n1\tAda, Countess\n")?;
    let output = dir.path().join("people.avro");

    let opts = ConvertOptions::new().with_delimiter("\\t").with_header(true);
    text_to_container(&[input], &output, &opts)?;

    let (_, records) = read_container(&output)?;
    assert_eq!(records[0].get("name"), Some(&s("Ada, Countess")));
    Ok(())
}

#[test]
fn test_quoted_cells_keep_delimiters_and_newlines() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(
        dir.path(),
        "notes.csv",
        "name,note\nAda,\"hello, world\"\nBob,\"line1\nline2\"\nCy,\"say \"\"hi\"\"\"\n",
    )?;
    let output = dir.path().join("notes.avro");

    text_to_container(&[input], &output, &ConvertOptions::new().with_header(true))?;

    let (_, records) = read_container(&output)?;
    let notes: Vec<_> = records.iter().filter_map(|r| r.get("note").cloned()).collect();
    assert_eq!(notes, [s("hello, world"), s("line1\nline2"), s("say \"hi\"")]);
    Ok(())
}

#[test]
fn test_deflate_container() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let rows: String = (0..500).map(|i| format!("{i},name-{i}\n")).collect();
    let input = write_text(dir.path(), "many.csv", &format!("id,name\n{rows}"))?;
    let output = dir.path().join("many.avro");

    let opts = ConvertOptions::new().with_compression(csvavro::Compression::Deflate);
    let summary = text_to_container(&[input], &output, &opts)?;
    assert_eq!(summary.records, 500);

    let header = csvavro::io::container::ContainerHeader::read(&output)?;
    assert_eq!(header.codec_name(), "deflate");
    let (_, records) = read_container(&output)?;
    assert_eq!(records.len(), 500);
    assert_eq!(records[499].get("name"), Some(&s("name-499")));
    Ok(())
}

#[test]
fn test_header_only_input_writes_empty_container() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "empty.csv", "id,name\n")?;
    let output = dir.path().join("empty.avro");

    let summary = text_to_container(&[input], &output, &ConvertOptions::new())?;
    assert_eq!(summary.records, 0);

    let (schema, records) = read_container(&output)?;
    assert_eq!(schema.fields.len(), 2);
    assert!(records.is_empty());
    Ok(())
}

#[test]
fn test_invalid_record_names_fail_cleanly() -> anyhow::Result<()> {
    let dir = scratch_dir()?;
    let input = write_text(dir.path(), "people.csv", "id,name\n1,Ada\n")?;
    let schema_path = write_text(
        dir.path(),
        "bad.avsc",
        r#"{"type": "record", "name": "bad name", "fields": [
            {"name": "id", "type": "string"},
            {"name": "name", "type": "string"}
        ]}"#,
    )?;

    let from_schema = dir.path().join("from_schema.avro");
    let err = text_to_container(
        &[input.clone()],
        &from_schema,
        &ConvertOptions::new().with_schema(&schema_path),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::Schema(_)), "{err}");
    assert!(!from_schema.exists());

    let from_option = dir.path().join("from_option.avro");
    let err = text_to_container(
        &[input],
        &from_option,
        &ConvertOptions::new().with_record_name("monthly report"),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::Schema(_)), "{err}");
    assert!(!from_option.exists());
    Ok(())
}
