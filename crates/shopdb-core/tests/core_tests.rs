use std::collections::BTreeMap;
use std::fs;

use tempfile::TempDir;

use shopdb_core::browse::browse;
use shopdb_core::catalog::{load_catalog, load_dir, CsvDirSource};
use shopdb_core::corpus::Corpus;
use shopdb_core::price::parse_price_constraint;
use shopdb_core::types::{FieldValue, PriceConstraint};
use shopdb_core::Error;

fn write(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn load_dir_reads_csv_files_in_name_order() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "mobile.csv", "Brand,Model,Selling Price\nApple,iPhone 15,\"79,900\"\n");
    write(&tmp, "laptop.csv", "Brand,Model,Price\nDell,XPS 13,99990\nHP,Pavilion,nan\n");
    write(&tmp, "notes.txt", "not a table");

    let tables = load_dir(tmp.path()).expect("load dir");
    let categories: Vec<&str> = tables.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(categories, vec!["laptop", "mobile"]);

    let catalog = load_catalog(&CsvDirSource::new(tmp.path())).expect("catalog");
    assert_eq!(catalog.len(), 3);
    let records: Vec<_> = catalog.records().collect();
    assert_eq!(records[0].get("price"), Some(&FieldValue::Number(99990.0)));
    assert_eq!(records[1].get("price"), Some(&FieldValue::Missing));
    assert_eq!(records[1].price(), None);
    assert_eq!(records[2].category, "mobile");
    assert_eq!(records[2].price(), Some(79900.0));
}

#[test]
fn corrupt_category_is_skipped() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "headphone.csv", "Brand,Name\nSony,WF-C500\n");
    // invalid UTF-8 makes the CSV reader fail for this file only
    fs::write(tmp.path().join("laptop.csv"), b"Brand,Model\n\xff\xfe,\xff\n").unwrap();

    let catalog = load_catalog(&CsvDirSource::new(tmp.path())).expect("one category survives");
    assert_eq!(catalog.categories().collect::<Vec<_>>(), vec!["headphone"]);
}

#[test]
fn empty_directory_is_empty_catalog() {
    let tmp = TempDir::new().unwrap();
    let err = load_catalog(&CsvDirSource::new(tmp.path())).expect_err("nothing to load");
    assert!(matches!(err, Error::EmptyCatalog));
}

#[test]
fn missing_directory_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let source = CsvDirSource::new(tmp.path().join("absent"));
    assert_eq!(source.dir(), tmp.path().join("absent"));
    let err = load_catalog(&source).expect_err("missing dir");
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn catalog_to_corpus_to_browse() {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp,
        "laptop.csv",
        "Brand,Model,RAM,Price\nDell,Inspiron 15,8GB,\"45,990\"\n\
         HP,Victus,16GB,\"78,990\"\nDell,XPS 13,16GB,\"1,29,990\"\n",
    );
    let catalog = load_catalog(&CsvDirSource::new(tmp.path())).expect("catalog");
    let corpus = Corpus::from(catalog);
    assert_eq!(corpus.len(), 3);
    assert!(corpus.documents()[0].text.starts_with("laptop laptop laptop brand Dell Dell Dell"));

    let filters = BTreeMap::from([("ram".to_string(), "16gb".to_string())]);
    let out = browse(corpus.metadata(), "laptop", &filters, parse_price_constraint("under 100000")).expect("browse");
    let models: Vec<String> = out.iter().filter_map(|r| r.text("model")).collect();
    assert_eq!(models, vec!["Victus"]);

    let all = browse(corpus.metadata(), "laptop", &BTreeMap::new(), PriceConstraint::UNBOUNDED).expect("browse");
    let prices: Vec<Option<f64>> = all.iter().map(|r| r.price()).collect();
    assert_eq!(prices, vec![Some(45990.0), Some(78990.0), Some(129990.0)]);
}
