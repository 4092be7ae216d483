//! 区切り文字付きテキスト（CSV）と空白区切りテキストの読み込み

use crate::api::{Delimiter, TextEncoding};
use crate::encoding::decode_text;
use crate::error::ExportError;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Dataset};
use csv_core::ReadFieldResult;

const UTF8_BOM: char = '\u{FEFF}';

impl Dataset {
    /// CSVバイト列から表を読み込む
    ///
    /// 先頭行を列名として扱います。引用符で囲まれたフィールドは文字列のまま、
    /// それ以外のフィールドは`CellValue::infer`で型推論されます。
    /// 列数の揃わない行がある場合は`ExportError::Import`を返します。
    ///
    /// 入力サイズの上限はデフォルト値（512MB）です。上限を変更する場合は
    /// `Exporter::import_csv`を使用してください。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use exportzero::{CellValue, Dataset, Delimiter, TextEncoding};
    ///
    /// let csv = b"a;b;c\n1;x;\"2\"\n";
    /// let dataset = Dataset::from_csv(csv, Delimiter::Semicolon, TextEncoding::Utf8).unwrap();
    /// assert_eq!(dataset.columns(), ["a", "b", "c"]);
    /// assert_eq!(
    ///     dataset.rows()[0],
    ///     vec![CellValue::Int(1), CellValue::String("x".into()), CellValue::String("2".into())]
    /// );
    /// ```
    pub fn from_csv(
        bytes: &[u8],
        delimiter: Delimiter,
        encoding: TextEncoding,
    ) -> Result<Dataset, ExportError> {
        Self::read_csv(bytes, delimiter, encoding, &SecurityConfig::default())
    }

    pub(crate) fn read_csv(
        bytes: &[u8],
        delimiter: Delimiter,
        encoding: TextEncoding,
        security: &SecurityConfig,
    ) -> Result<Dataset, ExportError> {
        security.check_input_size(bytes.len() as u64)?;

        let text = decode_text(bytes, encoding)?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);
        let quoted = quoted_fields(text.as_bytes(), delimiter.as_byte());

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let mut dataset = Dataset::new(headers.iter());
        // quoted[0]はヘッダー行
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let flags = quoted.get(index + 1).map(Vec::as_slice).unwrap_or(&[]);
            let row = record
                .iter()
                .enumerate()
                .map(|(col, field)| match flags.get(col) {
                    Some(&true) if !field.is_empty() => CellValue::String(field.to_string()),
                    _ => CellValue::infer(field),
                })
                .collect();
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// 空白区切りのテキストから表を生成する
    ///
    /// 各行を空白で分割し、列名は`0`, `1`, `2`, ...とします。
    /// 短い行は`Empty`で埋められます。各トークンは`CellValue::infer`で型推論されます。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use exportzero::{CellValue, Dataset};
    ///
    /// let dataset = Dataset::from_whitespace_text("a b c\nd e");
    /// assert_eq!(dataset.columns(), ["0", "1", "2"]);
    /// assert_eq!(dataset.rows()[1][2], CellValue::Empty);
    /// ```
    pub fn from_whitespace_text(text: &str) -> Dataset {
        let lines: Vec<Vec<&str>> = split_lines(text)
            .map(|line| line.split_whitespace().collect())
            .collect();
        let width = lines.iter().map(Vec::len).max().unwrap_or(0);

        Dataset {
            columns: (0..width).map(|i| i.to_string()).collect(),
            rows: lines
                .into_iter()
                .map(|tokens| {
                    let mut row: Vec<CellValue> =
                        tokens.into_iter().map(CellValue::infer).collect();
                    row.resize(width, CellValue::Empty);
                    row
                })
                .collect(),
        }
    }
}

/// 各レコードの各フィールドが引用符で始まっていたかを返す
///
/// csvクレートと同じcsv-coreの状態機械で読むため、空行の扱いを含めて
/// `csv::Reader`のレコードと1対1に対応します。
fn quoted_fields(input: &[u8], delimiter: u8) -> Vec<Vec<bool>> {
    let mut reader = csv_core::ReaderBuilder::new().delimiter(delimiter).build();
    // フィールドの内容は使わないので、出力バッファは使い回す
    let mut output = [0u8; 1024];
    let mut records = Vec::new();
    let mut current = Vec::new();
    let mut pos = 0;
    let mut field_start = 0;

    loop {
        let (result, nin, _) = reader.read_field(&input[pos..], &mut output);
        pos += nin;
        match result {
            ReadFieldResult::InputEmpty | ReadFieldResult::OutputFull => {}
            ReadFieldResult::Field { record_end } => {
                // 前のレコードの改行や空行がフィールドの先頭に残ることがある
                let quoted = input[field_start..pos]
                    .iter()
                    .find(|&&b| b != b'\r' && b != b'\n')
                    .map_or(false, |&b| b == b'"');
                current.push(quoted);
                field_start = pos;
                if record_end {
                    records.push(std::mem::take(&mut current));
                }
            }
            ReadFieldResult::End => break,
        }
    }
    records
}

/// 改行で分割する（各行末尾の`\r`は除去）
///
/// 末尾が改行で終わる場合、最後の空行も1行として含まれます。
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv_typed() {
        let csv = b"name,qty,price,ok\napple,3,1.5,true\npear,,2.0,false\n";
        let dataset = Dataset::from_csv(csv, Delimiter::Comma, TextEncoding::Utf8).unwrap();

        assert_eq!(dataset.columns(), ["name", "qty", "price", "ok"]);
        assert_eq!(dataset.height(), 2);
        assert_eq!(
            dataset.rows()[1],
            vec![
                CellValue::String("pear".into()),
                CellValue::Empty,
                CellValue::Float(2.0),
                CellValue::Bool(false),
            ]
        );
    }

    #[test]
    fn test_from_csv_tab_and_quotes() {
        let csv = b"a\tb\n\"x\ty\"\t\"say \"\"hi\"\"\"\n";
        let dataset = Dataset::from_csv(csv, Delimiter::Tab, TextEncoding::Utf8).unwrap();
        assert_eq!(
            dataset.rows()[0],
            vec![
                CellValue::String("x\ty".into()),
                CellValue::String("say \"hi\"".into())
            ]
        );
    }

    #[test]
    fn test_from_csv_quoted_fields_stay_strings() {
        let csv = b"zip,flag,n,note\n\"007\",\"TRUE\",007,\"\"\n\n\"1.5\",false,2,x\r\n";
        let dataset = Dataset::from_csv(csv, Delimiter::Comma, TextEncoding::Utf8).unwrap();
        assert_eq!(
            dataset.rows(),
            &[
                vec![
                    CellValue::String("007".into()),
                    CellValue::String("TRUE".into()),
                    CellValue::Int(7),
                    CellValue::Empty,
                ],
                vec![
                    CellValue::String("1.5".into()),
                    CellValue::Bool(false),
                    CellValue::Int(2),
                    CellValue::String("x".into()),
                ],
            ]
        );
    }

    #[test]
    fn test_quoted_fields_align_with_records() {
        let flags = quoted_fields(b"a,\"b\"\r\n\n\"1\",2", b',');
        assert_eq!(flags, vec![vec![false, true], vec![true, false]]);

        // 出力バッファより長いフィールド
        let long = format!("x\n\"{}\"\n", "y".repeat(5000));
        assert_eq!(quoted_fields(long.as_bytes(), b','), vec![vec![false], vec![true]]);
    }

    #[test]
    fn test_from_csv_strips_bom() {
        let csv = "\u{FEFF}a,b\n1,2\n".as_bytes();
        let dataset = Dataset::from_csv(csv, Delimiter::Comma, TextEncoding::Utf8).unwrap();
        assert_eq!(dataset.columns(), ["a", "b"]);
    }

    #[test]
    fn test_from_csv_latin1() {
        let csv = [b'n', b'\n', b'c', b'a', b'f', 0xE9, b'\n'];
        let dataset = Dataset::from_csv(&csv, Delimiter::Comma, TextEncoding::Iso8859_1).unwrap();
        assert_eq!(dataset.rows()[0], vec![CellValue::String("café".into())]);
    }

    #[test]
    fn test_from_csv_ragged_rows() {
        let csv = b"a,b\n1,2,3\n";
        assert!(matches!(
            Dataset::from_csv(csv, Delimiter::Comma, TextEncoding::Utf8),
            Err(ExportError::Import(_))
        ));
    }

    #[test]
    fn test_from_csv_invalid_encoding() {
        let csv = [b'a', b'\n', 0xFF, b'\n'];
        assert!(matches!(
            Dataset::from_csv(&csv, Delimiter::Comma, TextEncoding::Utf8),
            Err(ExportError::Encoding(_))
        ));
    }

    #[test]
    fn test_from_whitespace_text() {
        let dataset = Dataset::from_whitespace_text("1  2\r\nthree\n\n");
        assert_eq!(dataset.columns(), ["0", "1"]);
        assert_eq!(dataset.height(), 4);
        assert_eq!(dataset.rows()[0], vec![CellValue::Int(1), CellValue::Int(2)]);
        assert_eq!(
            dataset.rows()[1],
            vec![CellValue::String("three".into()), CellValue::Empty]
        );
        assert_eq!(dataset.rows()[3], vec![CellValue::Empty, CellValue::Empty]);
    }

    #[test]
    fn test_from_whitespace_text_empty() {
        let dataset = Dataset::from_whitespace_text("");
        assert_eq!(dataset.width(), 0);
    }

    #[test]
    fn test_split_lines() {
        let lines: Vec<&str> = split_lines("a\r\nb\nc").collect();
        assert_eq!(lines, vec!["a", "b", "c"]);

        let lines: Vec<&str> = split_lines("a\n").collect();
        assert_eq!(lines, vec!["a", ""]);
    }
}
