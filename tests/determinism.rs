mod common;

use std::sync::Arc;

use common::{explorer, query};
use corpus::CorpusHandle;

#[tokio::test]
async fn equal_queries_share_one_cached_corpus() {
    let (explorer, _refs) = explorer(20);

    // Same query, spelled differently: alias vs code, padding, language order.
    let a = query(&[
        ("doc_type_selection", "digibok"),
        ("language", "nob OR nno"),
        ("from_year", "1960"),
        ("title", ""),
    ]);
    let b = query(&[
        ("document_type", " book "),
        ("lang", "NNO OR nob OR nno"),
        ("from_year", " 1960"),
    ]);

    let first = explorer.resolve(&a).await.unwrap();
    let second = explorer.resolve(&b).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(explorer.backend().build_calls(), 1);
    let stats = explorer.stats();
    assert_eq!(stats.metadata.hits, 1);
    assert_eq!(stats.metadata.misses, 1);
}

#[tokio::test]
async fn different_queries_are_cached_separately() {
    let (explorer, _refs) = explorer(10);
    let a = query(&[("document_type", "digibok"), ("to_year", "1990")]);
    let b = query(&[("document_type", "digibok"), ("to_year", "1991")]);

    let first = explorer.resolve(&a).await.unwrap();
    let second = explorer.resolve(&b).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(explorer.backend().build_calls(), 2);
}

#[tokio::test]
async fn same_upload_twice_gives_identical_rows() {
    let (explorer, _refs) = explorer(5);
    let urns: Vec<String> = explorer
        .backend()
        .documents()
        .iter()
        .step_by(3)
        .map(|d| d.record.urn.clone())
        .collect();
    let csv = format!("urn\n{}\n", urns.join("\n"));

    let (handle_a, first) = explorer.upload("liste.csv", csv.as_bytes()).await.unwrap();
    let (handle_b, second) = explorer.upload("liste.csv", csv.as_bytes()).await.unwrap();

    assert_eq!(handle_a, handle_b);
    assert_eq!(first.rows(), second.rows());
    assert_eq!(first.identifiers(), urns);
    assert_eq!(explorer.backend().resolve_calls(), 1);
}

#[tokio::test]
async fn identifier_order_is_part_of_the_key() {
    let (explorer, _refs) = explorer(2);
    let docs = explorer.backend().documents();
    let forward = vec![docs[0].record.urn.clone(), docs[1].record.urn.clone()];
    let backward: Vec<String> = forward.iter().rev().cloned().collect();

    let a = explorer
        .resolve(&CorpusHandle::Identifiers { urns: forward.clone() })
        .await
        .unwrap();
    let b = explorer
        .resolve(&CorpusHandle::Identifiers { urns: backward.clone() })
        .await
        .unwrap();

    assert_eq!(a.identifiers(), forward);
    assert_eq!(b.identifiers(), backward);
    assert_eq!(explorer.backend().resolve_calls(), 2);
}

#[tokio::test]
async fn repeated_and_blank_identifiers_collapse() {
    let (explorer, _refs) = explorer(2);
    let urn = explorer.backend().documents()[0].record.urn.clone();

    let messy = CorpusHandle::Identifiers {
        urns: vec![format!(" {urn} "), String::new(), urn.clone()],
    };
    let clean = CorpusHandle::Identifiers { urns: vec![urn] };

    let a = explorer.resolve(&messy).await.unwrap();
    let b = explorer.resolve(&clean).await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.len(), 1);
}
