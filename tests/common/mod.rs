#![allow(dead_code)]

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// `{group: text, value: number}` = [("a", 1), ("a", 3), ("b", 2)]
pub fn group_value_frame() -> DataFrame {
    df!(
        "group" => ["a", "a", "b"],
        "value" => [1.0f64, 3.0, 2.0]
    )
    .unwrap()
}

/// A small differential-expression style table.
pub fn genes_frame() -> DataFrame {
    df!(
        "gene_name" => ["BRCA1", "TP53", "EGFR", "MYC", "KRAS", "PTEN"],
        "group" => ["ctrl", "ctrl", "ctrl", "treated", "treated", "treated"],
        "logFC" => [0.5f64, -1.2, 2.3, 1.1, -0.4, 0.9],
        "padj" => [0.04f64, 0.001, 0.2, 0.0, 0.5, 0.03],
        "cc_q75" => [10.0f64, 12.5, 8.0, 15.0, 9.5, 11.0]
    )
    .unwrap()
}

/// Write `df` as CSV into `dir` and return the file path.
pub fn write_csv(dir: &Path, name: &str, df: &DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    let mut df = df.clone();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}
