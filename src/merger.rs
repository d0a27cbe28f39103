//! Merger Module
//!
//! 複数のテーブルを1つのマスターテーブルに結合し、`pdffile`列の値で再分割するモジュール。
//! `SplitMode::ByPdfFile`でのみ使用されます。

use tracing::{debug, info};

use crate::error::SheetSplitError;
use crate::types::{Row, Table, PDFFILE_COLUMN};

/// `pdffile`列の値ごとのグループ
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    /// `pdffile`列の値
    pub pdffile: String,
    /// このファイルに属する行（元の順序を維持）
    pub table: Table,
}

/// 再分割の結果
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// 初出順のグループ
    pub groups: Vec<FileGroup>,
    /// `pdffile`が欠損しているため、どのグループにも属さない行数
    pub orphan_rows: usize,
}

/// テーブルを縦に結合する
///
/// 列は初出順の和集合になり、あるテーブルに存在しない列は欠損値で埋められます。
pub fn concat_tables(tables: &[Table]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for table in tables {
        for column in table.columns() {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(tables.iter().map(Table::len).sum());
    for table in tables {
        // 各列のマスター上の位置
        let mapping: Vec<usize> = table
            .columns()
            .iter()
            .map(|c| columns.iter().position(|m| m == c).unwrap_or_default())
            .collect();

        for row in table.rows() {
            let mut cells = vec![None; columns.len()];
            for (source, &target) in mapping.iter().enumerate() {
                cells[target] = row.get(source).map(str::to_string);
            }
            rows.push(Row::new(cells));
        }
    }

    Table::new(columns, rows)
}

/// マスターテーブルを`pdffile`列の値で分割する
///
/// グループは値の初出順に並び、各グループ内の行は元の順序を維持します。
///
/// # 戻り値
///
/// * `Ok(Partition)` - 分割結果
/// * `Err(SheetSplitError::MissingColumn)` - `pdffile`列が存在しない場合
pub fn partition_by_pdffile(master: &Table) -> Result<Partition, SheetSplitError> {
    let index = master
        .column_index(PDFFILE_COLUMN)
        .ok_or_else(|| SheetSplitError::MissingColumn {
            column: PDFFILE_COLUMN.to_string(),
        })?;

    let mut order: Vec<String> = Vec::new();
    let mut buckets: Vec<Vec<Row>> = Vec::new();
    let mut orphan_rows = 0;

    for row in master.rows() {
        let Some(value) = row.get(index) else {
            orphan_rows += 1;
            continue;
        };
        match order.iter().position(|v| v == value) {
            Some(slot) => buckets[slot].push(row.clone()),
            None => {
                order.push(value.to_string());
                buckets.push(vec![row.clone()]);
            }
        }
    }

    let groups: Vec<FileGroup> = order
        .into_iter()
        .zip(buckets)
        .map(|(pdffile, rows)| FileGroup {
            pdffile,
            table: Table::new(master.columns().to_vec(), rows),
        })
        .collect();

    debug!(orphan_rows, "partitioned master table");
    Ok(Partition {
        groups,
        orphan_rows,
    })
}

/// テーブルを結合し、`pdffile`の値で再分割する
///
/// # 戻り値
///
/// * `Err(SheetSplitError::NoTables)` - テーブルが1つもない場合
/// * `Err(SheetSplitError::MissingColumn)` - 結合後に`pdffile`列がない場合
pub fn merge_and_split(tables: &[Table]) -> Result<Partition, SheetSplitError> {
    if tables.is_empty() {
        return Err(SheetSplitError::NoTables);
    }

    let master = concat_tables(tables);
    let partition = partition_by_pdffile(&master)?;
    info!(
        tables = tables.len(),
        rows = master.len(),
        files = partition.groups.len(),
        "merged tables and found distinct pdffile values"
    );
    Ok(partition)
}
