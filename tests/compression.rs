//! Tests for transparently compressed text inputs and outputs.

#[cfg(feature = "compression-gzip")]
mod gzip {
    use csvavro::io::compression::{auto_detect_reader, auto_detect_writer, codec_for_path};
    use csvavro::testing::*;
    use csvavro::{ConvertOptions, container_to_text, text_to_container};
    use std::fs::File;
    use std::io::{Read, Write};

    #[test]
    fn test_gzip_text_round_trip() -> anyhow::Result<()> {
        let dir = scratch_dir()?;
        let input = dir.path().join("people.csv.gz");
        {
            let mut writer = auto_detect_writer(File::create(&input)?, &input)?;
            writer.write_all(b"id,name\n1,Ada\n2,Bob\n")?;
            writer.flush()?;
        }

        let container = dir.path().join("people.avro");
        let summary = text_to_container(&[input], &container, &ConvertOptions::new())?;
        assert_eq!(summary.records, 2);
        let (schema, _) = read_container(&container)?;
        assert_eq!(schema.name, "people_csv");

        let output = dir.path().join("back.csv.gz");
        container_to_text(&[container], &output, &ConvertOptions::new().with_header(true))?;

        let mut text = String::new();
        auto_detect_reader(File::open(&output)?, &output)?.read_to_string(&mut text)?;
        assert_eq!(text, "id,name\n1,Ada\n2,Bob\n");
        Ok(())
    }

    #[test]
    fn test_magic_bytes_detect_gzip_without_extension() -> anyhow::Result<()> {
        let dir = scratch_dir()?;
        let packed = dir.path().join("packed.csv.gz");
        {
            let mut writer = auto_detect_writer(File::create(&packed)?, &packed)?;
            writer.write_all(b"id,name\n1,Ada\n")?;
        }
        let disguised = dir.path().join("disguised.csv");
        std::fs::rename(&packed, &disguised)?;

        let container = dir.path().join("out.avro");
        text_to_container(&[disguised], &container, &ConvertOptions::new())?;
        let (_, records) = read_container(&container)?;
        assert_eq!(records[0].get("name"), Some(&s("Ada")));
        Ok(())
    }

    #[test]
    fn test_codec_lookup_by_extension() {
        assert_eq!(codec_for_path("a.CSV.GZ").map(|c| c.name().to_string()), Some("gzip".into()));
        assert!(codec_for_path("a.csv").is_none());
    }
}

#[cfg(feature = "compression-zstd")]
#[test]
fn test_zstd_input() -> anyhow::Result<()> {
    use csvavro::io::compression::auto_detect_writer;
    use csvavro::testing::*;
    use std::io::Write;

    let dir = scratch_dir()?;
    let input = dir.path().join("rows.tsv.zst");
    {
        let mut writer = auto_detect_writer(std::fs::File::create(&input)?, &input)?;
        writer.write_all(b"id\tname\n1\tAda\n")?;
    }
    let container = dir.path().join("rows.avro");
    csvavro::text_to_container(&[input], &container, &csvavro::ConvertOptions::new())?;
    let (schema, records) = read_container(&container)?;
    assert_eq!(schema.field_names().collect::<Vec<_>>(), ["id", "name"]);
    assert_eq!(records.len(), 1);
    Ok(())
}
