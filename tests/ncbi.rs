use std::fs;

use assert_matches::assert_matches;
use serde_json::Value;

use gene_harvester::error::HarvestError;
use gene_harvester::ncbi::{parse_count, parse_id_list, parse_summaries, parse_taxonomy_id};

fn fixture(name: &str) -> Value {
    let raw = fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn extract_gene_names_from_esummary() {
    let records = parse_summaries(&fixture("esummary_gene.json")).unwrap();
    let pairs = records
        .iter()
        .map(|record| (record.id.as_str(), record.name.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec![("7157", "TP53"), ("672", "BRCA1"), ("100", "ADA")]);
}

#[test]
fn extract_page_from_esearch() {
    let body = fixture("esearch_gene.json");
    assert_eq!(parse_count(&body), Some(6000));
    assert_eq!(
        parse_id_list(&body).unwrap(),
        vec!["105379212", "105379213", "105379214"]
    );
    assert_eq!(parse_taxonomy_id(&body).unwrap().as_str(), "105379212");
}

#[test]
fn summaries_without_uids_keep_key_order() {
    let body: Value = serde_json::from_str(
        r#"{"result": {"20": {"name": "B"}, "10": {"name": "A"}, "30": {"uid": "30"}}}"#,
    )
    .unwrap();
    let names = parse_summaries(&body)
        .unwrap()
        .into_iter()
        .map(|record| record.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["B", "A", "Unknown"]);
}

#[test]
fn esearch_error_is_malformed() {
    let body: Value = serde_json::from_str(
        r#"{"esearchresult": {"ERROR": "Invalid query", "idlist": []}}"#,
    )
    .unwrap();
    assert_matches!(parse_id_list(&body), Err(HarvestError::MalformedResponse(_)));
}
