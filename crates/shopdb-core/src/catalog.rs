use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::traits::CatalogSource;
use crate::types::{FieldValue, Record};

/// Raw, untyped rows of one category table as read from its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Reads a headed CSV table. Rows may be shorter or longer than the header.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for row in rdr.records() {
            rows.push(row?.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }
}

/// Canonical column name: trimmed, lower-cased, spaces replaced by underscores.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Normalized records grouped by category, categories in sorted order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, Vec<Record>>,
}

impl Catalog {
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records in category order, then row order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.tables.values().flatten()
    }

    pub fn into_records(self) -> impl Iterator<Item = Record> {
        self.tables.into_values().flatten()
    }
}

/// Builds a [`Catalog`] from per-category tables.
///
/// A category whose table failed to load is dropped with a warning. If no
/// category survives, returns [`Error::EmptyCatalog`].
pub fn normalize<I>(tables: I) -> Result<Catalog>
where
    I: IntoIterator<Item = (String, Result<RawTable>)>,
{
    let mut catalog = Catalog::default();
    for (category, table) in tables {
        match table {
            Ok(table) => {
                let records = normalize_table(&category, table);
                info!(category = %category, records = records.len(), "loaded category");
                catalog.tables.insert(category, records);
            }
            Err(e) => warn!(category = %category, error = %e, "skipping category"),
        }
    }
    if catalog.tables.is_empty() {
        return Err(Error::EmptyCatalog);
    }
    Ok(catalog)
}

fn normalize_table(category: &str, table: RawTable) -> Vec<Record> {
    let columns: Vec<String> = table.headers.iter().map(|h| normalize_column(h)).collect();
    table
        .rows
        .into_iter()
        .enumerate()
        .map(|(ordinal, row)| {
            let fields = columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let value = row.get(i).map_or(FieldValue::Missing, |cell| FieldValue::parse(cell));
                    (col.clone(), value)
                })
                .collect();
            Record { category: category.to_string(), ordinal, fields }
        })
        .collect()
}

/// Reads every `*.csv` directly under `dir`; the file stem names the category.
///
/// Files that cannot be read come back as [`Error::LoadFailure`] entries so
/// that [`normalize`] can skip them. Only an unreadable directory is an error.
pub fn load_dir(dir: &Path) -> Result<Vec<(String, Result<RawTable>)>> {
    std::fs::read_dir(dir)?;
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();
    if files.is_empty() {
        warn!(dir = %dir.display(), "no CSV files found");
    }
    Ok(files
        .into_iter()
        .filter_map(|path| {
            let category = path.file_stem()?.to_string_lossy().to_string();
            let table = std::fs::File::open(&path)
                .map_err(Error::from)
                .and_then(RawTable::from_csv)
                .map_err(|e| Error::LoadFailure { category: category.clone(), reason: e.to_string() });
            Some((category, table))
        })
        .collect())
}

/// Catalog source backed by a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CatalogSource for CsvDirSource {
    fn tables(&self) -> Result<Vec<(String, Result<RawTable>)>> {
        load_dir(&self.dir)
    }
}

/// Loads and normalizes a catalog from any source.
pub fn load_catalog(source: &dyn CatalogSource) -> Result<Catalog> {
    normalize(source.tables()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_canonical() {
        assert_eq!(normalize_column("  Selling Price "), "selling_price");
        assert_eq!(normalize_column("RAM"), "ram");
    }

    #[test]
    fn short_rows_fill_missing() {
        let table = RawTable::from_csv("Brand,Model,Price\nDell,XPS\n".as_bytes()).expect("csv");
        let catalog = normalize(vec![("laptop".to_string(), Ok(table))]).expect("catalog");
        let rec = catalog.records().next().expect("one record");
        assert_eq!(rec.get("price"), Some(&FieldValue::Missing));
        assert_eq!(rec.text("model").as_deref(), Some("XPS"));
    }

    #[test]
    fn failed_category_is_skipped() {
        let ok = RawTable { headers: vec!["Name".into()], rows: vec![vec!["Buds".into()]] };
        let catalog = normalize(vec![
            ("headphone".to_string(), Ok(ok)),
            ("laptop".to_string(), Err(Error::LoadFailure { category: "laptop".into(), reason: "corrupt".into() })),
        ])
        .expect("one category loads");
        assert_eq!(catalog.categories().collect::<Vec<_>>(), vec!["headphone"]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn nothing_loaded_is_empty_catalog() {
        let err = normalize(vec![(
            "laptop".to_string(),
            Err(Error::LoadFailure { category: "laptop".into(), reason: "missing".into() }),
        )])
        .expect_err("no categories");
        assert!(matches!(err, Error::EmptyCatalog));
    }
}
