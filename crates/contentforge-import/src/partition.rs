use std::path::{Path, PathBuf};

use crate::errors::ImportError;

/// One table file queued for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub table: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Enumerate the `*.csv` table files in a run directory.
pub fn discover_table_files(dir: &Path) -> Result<Vec<TableFile>, ImportError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let Some(table) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let bytes = entry.metadata()?.len();
        files.push(TableFile {
            table: table.to_string(),
            path,
            bytes,
        });
    }
    // Directory order is platform-dependent; sort so callers start from a
    // stable order before shuffling.
    files.sort_by(|a, b| a.table.cmp(&b.table));
    Ok(files)
}

/// Worker pool size for a given parallelism: `ceil(parallelism / 1.5)`,
/// at least one.
pub fn default_worker_count(parallelism: usize) -> usize {
    (parallelism * 2).div_ceil(3).max(1)
}

/// Greedy size-balanced partitioning: each file lands in the currently
/// lightest bucket by running byte total.
///
/// Callers shuffle the input first so size/order correlation does not pin
/// all large tables onto one bucket.
pub fn partition_by_size(files: Vec<TableFile>, buckets: usize) -> Vec<Vec<TableFile>> {
    let buckets = buckets.max(1);
    let mut assignment: Vec<Vec<TableFile>> = (0..buckets).map(|_| Vec::new()).collect();
    let mut totals = vec![0_u64; buckets];

    for file in files {
        let lightest = totals
            .iter()
            .enumerate()
            .min_by_key(|(_, total)| **total)
            .map(|(index, _)| index)
            .unwrap_or_default();
        totals[lightest] += file.bytes;
        assignment[lightest].push(file);
    }

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(table: &str, bytes: u64) -> TableFile {
        TableFile {
            table: table.to_string(),
            path: PathBuf::from(format!("{table}.csv")),
            bytes,
        }
    }

    #[test]
    fn worker_count_rounds_up() {
        assert_eq!(default_worker_count(1), 1);
        assert_eq!(default_worker_count(2), 2);
        assert_eq!(default_worker_count(3), 2);
        assert_eq!(default_worker_count(6), 4);
        assert_eq!(default_worker_count(8), 6);
    }

    #[test]
    fn partition_keeps_every_file() {
        let files = vec![file("a", 10), file("b", 20), file("c", 30), file("d", 40)];
        let buckets = partition_by_size(files.clone(), 3);
        assert_eq!(buckets.len(), 3);
        let total: usize = buckets.iter().map(Vec::len).sum();
        assert_eq!(total, files.len());
    }

    #[test]
    fn partition_balances_by_bytes() {
        // One dominant file should get a bucket of its own.
        let files = vec![file("big", 1000), file("a", 10), file("b", 10), file("c", 10)];
        let buckets = partition_by_size(files, 2);
        let totals: Vec<u64> = buckets
            .iter()
            .map(|bucket| bucket.iter().map(|file| file.bytes).sum())
            .collect();
        assert_eq!(totals.iter().max(), Some(&1000));
        assert_eq!(totals.iter().min(), Some(&30));
    }

    #[test]
    fn zero_buckets_clamps_to_one() {
        let files = vec![file("a", 10)];
        let buckets = partition_by_size(files, 0);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].len(), 1);
    }
}
