//! Round-trip Property Tests
//!
//! Exports followed by the matching import must reproduce the input:
//! text through every `TextEncoding`, typed tables through CSV with every `Delimiter`.

use exportzero::{
    decode_text, CellValue, Dataset, Delimiter, ExportRequest, Exporter, ExporterBuilder,
    FormatOptions, TargetFormat, TextEncoding,
};
use proptest::prelude::*;

fn exporter() -> Exporter {
    ExporterBuilder::new()
        .without_engines()
        .without_image_codec()
        .build()
        .unwrap()
}

fn text_for(encoding: TextEncoding) -> BoxedStrategy<String> {
    match encoding {
        TextEncoding::Ascii => "[ -~\n\t]{0,64}".boxed(),
        TextEncoding::Iso8859_1 => "[ -~\u{a0}-\u{ff}\n]{0,64}".boxed(),
        TextEncoding::Utf8 => "\\PC{0,64}".boxed(),
    }
}

/// 文字列・整数・有限の浮動小数点数・論理値・空セルのいずれか
///
/// 文字列は空でないもの（空文字列は空セルとして読み戻される）。
fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        "\\PC{1,12}".prop_map(CellValue::String),
        "[0-9]{1,4}|[+-]?[0-9]{1,3}\\.[0-9]{1,3}|true|FALSE|1e5".prop_map(CellValue::String),
        any::<i64>().prop_map(CellValue::Int),
        (-1.0e9..1.0e9f64).prop_map(CellValue::Float),
        any::<bool>().prop_map(CellValue::Bool),
        Just(CellValue::Empty),
    ]
}

/// 列数1〜5、行数0〜10の表
fn typed_table() -> impl Strategy<Value = Dataset> {
    (1usize..=5).prop_flat_map(|width| {
        prop::collection::vec(prop::collection::vec(cell(), width), 0..10).prop_map(
            move |rows| {
                let columns: Vec<String> = (0..width).map(|i| format!("c{}", i)).collect();
                Dataset::from_rows(columns, rows).unwrap()
            },
        )
    })
}

proptest! {
    #[test]
    fn prop_text_round_trip_every_encoding(
        (encoding, text) in prop::sample::select(TextEncoding::ALL.to_vec())
            .prop_flat_map(|encoding| (Just(encoding), text_for(encoding)))
    ) {
        let options = FormatOptions::new().with_encoding(encoding);
        let result = exporter()
            .export(ExportRequest::new(text.clone(), TargetFormat::Txt).with_options(options))
            .unwrap();

        prop_assert_eq!(decode_text(&result.bytes, encoding).unwrap(), text);
    }

    #[test]
    fn prop_csv_round_trip_every_delimiter(
        delimiter in prop::sample::select(Delimiter::ALL.to_vec()),
        dataset in typed_table(),
    ) {
        let options = FormatOptions::new().with_delimiter(delimiter);
        let result = exporter()
            .export(ExportRequest::new(dataset.clone(), TargetFormat::Csv).with_options(options))
            .unwrap();

        let restored = Dataset::from_csv(&result.bytes, delimiter, TextEncoding::Utf8).unwrap();
        prop_assert_eq!(restored, dataset);
    }

    #[test]
    fn prop_json_lines_match_text(text in "[a-z \n]{0,64}") {
        let result = exporter()
            .export(ExportRequest::new(text.clone(), TargetFormat::Json))
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&result.bytes).unwrap();
        let lines: Vec<String> = value["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|line| line.as_str().unwrap().to_string())
            .collect();
        prop_assert_eq!(lines.join("\n"), text);
    }
}

#[test]
fn test_csv_round_trip_typed_cells() {
    let dataset = Dataset::from_rows(
        ["id", "ratio", "flag", "note"],
        vec![
            vec![
                CellValue::Int(-4),
                CellValue::Float(2.0),
                CellValue::Bool(false),
                "quoted, \"text\"".into(),
            ],
            vec![
                CellValue::Int(7),
                CellValue::Float(0.25),
                CellValue::Bool(true),
                CellValue::Empty,
            ],
        ],
    )
    .unwrap();

    for delimiter in Delimiter::ALL {
        let options = FormatOptions::new().with_delimiter(delimiter);
        let result = exporter()
            .export(ExportRequest::new(dataset.clone(), TargetFormat::Csv).with_options(options))
            .unwrap();
        let restored = Dataset::from_csv(&result.bytes, delimiter, TextEncoding::Utf8).unwrap();
        assert_eq!(restored, dataset, "delimiter {:?}", delimiter);
    }
}

#[test]
fn test_csv_round_trip_strings_that_look_typed() {
    let dataset = Dataset::from_rows(
        ["zip", "flag", "exp", "signed", "note"],
        vec![vec![
            "007".into(),
            "true".into(),
            "1e5".into(),
            "+3".into(),
            "007 agents".into(),
        ]],
    )
    .unwrap();

    for delimiter in Delimiter::ALL {
        let options = FormatOptions::new().with_delimiter(delimiter);
        let result = exporter()
            .export(ExportRequest::new(dataset.clone(), TargetFormat::Csv).with_options(options))
            .unwrap();
        let restored = Dataset::from_csv(&result.bytes, delimiter, TextEncoding::Utf8).unwrap();
        assert_eq!(restored, dataset, "delimiter {:?}", delimiter);
    }
}

#[test]
fn test_csv_empty_string_reads_back_empty() {
    let dataset = Dataset::from_rows(
        ["a", "b"],
        vec![vec![CellValue::String(String::new()), CellValue::Int(1)]],
    )
    .unwrap();
    let result = exporter()
        .export(ExportRequest::new(dataset, TargetFormat::Csv))
        .unwrap();
    assert_eq!(result.bytes, b"a,b\n,1\n");

    let restored = Dataset::from_csv(&result.bytes, Delimiter::Comma, TextEncoding::Utf8).unwrap();
    assert_eq!(restored.rows()[0], vec![CellValue::Empty, CellValue::Int(1)]);
}
