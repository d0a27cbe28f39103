//! Worksheet Rendering
//!
//! テーブルを1枚のワークシートに書き込む処理を提供するモジュール。

use rust_xlsxwriter::{Format, FormatBorder, Worksheet, XlsxError};

use crate::types::Table;

/// 列のセル型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    /// すべての値が有限の数値として解釈できる
    Number,
    /// それ以外
    Text,
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// 各列のセル型を推定
///
/// 欠損値を除くすべての値が数値であり、かつ少なくとも1つ値がある列を数値列とします。
pub(crate) fn infer_column_kinds(table: &Table) -> Vec<ColumnKind> {
    (0..table.columns().len())
        .map(|col| {
            let mut values = table.rows().iter().filter_map(|row| row.get(col)).peekable();
            if values.peek().is_none() {
                return ColumnKind::Text;
            }
            if values.all(|v| parse_number(v).is_some()) {
                ColumnKind::Number
            } else {
                ColumnKind::Text
            }
        })
        .collect()
}

/// ヘッダー行の書式（太字 + 細罫線）
pub(crate) fn header_format() -> Format {
    Format::new().set_bold().set_border(FormatBorder::Thin)
}

/// テーブルをワークシートに書き込む
///
/// 1行目に列名、2行目以降にデータを出力します。行番号の列は出力しません。
/// 欠損値のセルは空のままにします。
pub(crate) fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    header: &Format,
) -> Result<(), XlsxError> {
    let kinds = infer_column_kinds(table);

    for (col, name) in table.columns().iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string_with_format(0, col, name, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, kind) in kinds.iter().enumerate() {
            let Some(value) = row.get(col) else {
                continue;
            };
            let excel_col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
            match (kind, parse_number(value)) {
                (ColumnKind::Number, Some(number)) => {
                    worksheet.write_number(excel_row, excel_col, number)?;
                }
                _ => {
                    worksheet.write_string(excel_row, excel_col, value)?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(())
}
