//! Backend equivalence tests.
//!
//! The snapshot and SQLite backends must answer every query identically
//! when they hold the same generation. Properties checked here:
//! - Same query, same generation → identical `QueryResult`
//! - Walking every page yields each match exactly once, in crawl order
//! - `total` does not depend on the requested page or page size

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use shelfscan_core::{
    catalog::{CatalogStore, SnapshotCatalog, SqliteCatalog},
    query::{Filter, Query, QueryEngine, QueryLimits, QueryRequest},
    record::{CatalogRecord, Generation},
    testing::fixtures,
};

const TITLE_WORDS: &[&str] = &[
    "Sapiens", "sharp", "OBJECTS", "Velvet", "attic", "Light", "Émile", "straße", "100%",
    "a_b", "Dune", "dune",
];

fn record_strategy() -> impl Strategy<Value = (Vec<usize>, u32, u8, bool)> {
    (
        prop::collection::vec(0..TITLE_WORDS.len(), 1..4),
        0u32..10_000,
        0u8..=5,
        any::<bool>(),
    )
}

fn records_strategy() -> impl Strategy<Value = Vec<CatalogRecord>> {
    prop::collection::vec(record_strategy(), 0..40).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (words, cents, rating, in_stock))| {
                let title = words
                    .iter()
                    .map(|&w| TITLE_WORDS[w])
                    .collect::<Vec<_>>()
                    .join(" ");
                fixtures::record(
                    &title,
                    &format!("https://shop.test/catalogue/book-{}/index.html", i),
                    f64::from(cents) / 100.0,
                    rating,
                    in_stock,
                )
            })
            .collect()
    })
}

fn search_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("".to_string())),
        Just(Some("  ".to_string())),
        Just(Some("DUNE".to_string())),
        Just(Some("émile".to_string())),
        Just(Some("STRASSE".to_string())),
        Just(Some("0%".to_string())),
        Just(Some("_".to_string())),
        Just(Some("ht".to_string())),
        Just(Some("velvet attic".to_string())),
    ]
}

fn price_bound_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        4 => prop::option::of((0u32..10_000).prop_map(|c| f64::from(c) / 100.0)),
        1 => (-10_000i32..0).prop_map(|c| Some(f64::from(c) / 100.0)),
        1 => Just(Some(f64::NAN)),
        1 => Just(Some(f64::INFINITY)),
        1 => Just(Some(f64::NEG_INFINITY)),
    ]
}

fn request_strategy() -> impl Strategy<Value = QueryRequest> {
    (
        prop::option::of(0u32..8),
        prop::option::of(0u32..25),
        price_bound_strategy(),
        price_bound_strategy(),
        prop::option::of(0u8..=6),
        prop::option::of(any::<bool>()),
        search_strategy(),
    )
        .prop_map(
            |(page, limit, min_price, max_price, min_rating, in_stock, search)| QueryRequest {
                page,
                limit,
                min_price,
                max_price,
                min_rating,
                in_stock,
                search,
            },
        )
}

/// Publish the same records to both backends.
fn engines(records: Vec<CatalogRecord>) -> (QueryEngine, QueryEngine) {
    let snapshot: Arc<dyn CatalogStore> = Arc::new(SnapshotCatalog::new());
    let sqlite: Arc<dyn CatalogStore> = Arc::new(SqliteCatalog::in_memory().unwrap());

    let (generation, duplicates) = Generation::from_records(records);
    assert!(duplicates.is_empty());
    snapshot.publish(generation.clone()).unwrap();
    sqlite.publish(generation).unwrap();

    (
        QueryEngine::new(snapshot, QueryLimits::default()),
        QueryEngine::new(sqlite, QueryLimits::default()),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_backends_answer_identically(
        records in records_strategy(),
        requests in prop::collection::vec(request_strategy(), 1..8),
    ) {
        let (snapshot, sqlite) = engines(records);

        for request in requests {
            let a = snapshot.search(request.clone()).unwrap();
            let b = sqlite.search(request.clone()).unwrap();
            prop_assert_eq!(a, b, "request {:?}", request);
        }
    }

    #[test]
    fn prop_pages_cover_matches_exactly_once(
        records in records_strategy(),
        request in request_strategy(),
        limit in 1u32..7,
    ) {
        let (snapshot, sqlite) = engines(records.clone());
        let base = QueryRequest { page: None, limit: Some(limit), ..request }
            .into_query(&QueryLimits::default());

        let filter = Filter::from_query(&base);
        let expected: Vec<String> = records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.id.clone())
            .collect();

        for engine in [&snapshot, &sqlite] {
            let mut collected = Vec::new();
            let mut page = 1;
            loop {
                let result = engine.execute(&base.clone().with_page(page, limit)).unwrap();
                prop_assert_eq!(result.total, expected.len() as u64);
                if result.items.is_empty() {
                    break;
                }
                prop_assert!(result.items.len() <= limit as usize);
                collected.extend(result.items.into_iter().map(|r| r.id));
                page += 1;
            }

            let unique: HashSet<_> = collected.iter().collect();
            prop_assert_eq!(unique.len(), collected.len());
            prop_assert_eq!(&collected, &expected);
        }
    }
}

#[test]
fn test_filter_scenario_on_both_backends() {
    let (snapshot, sqlite) = engines(fixtures::mixed_records());

    for engine in [&snapshot, &sqlite] {
        for limit in [1, 2, 3, 50] {
            let result = engine
                .search(QueryRequest {
                    limit: Some(limit),
                    min_price: Some(10.0),
                    max_price: Some(30.0),
                    min_rating: Some(4),
                    ..Default::default()
                })
                .unwrap();

            assert_eq!(result.total, 3);
            assert_eq!(result.items.len(), limit.min(3) as usize);
        }
    }

    let request = QueryRequest {
        min_price: Some(10.0),
        max_price: Some(30.0),
        min_rating: Some(4),
        ..Default::default()
    };
    let titles: Vec<_> = snapshot
        .search(request.clone())
        .unwrap()
        .items
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["Soumission", "Sharp Objects", "Sapiens"]);
    assert_eq!(snapshot.search(request.clone()).unwrap(), sqlite.search(request).unwrap());
}

#[test]
fn test_non_finite_price_bounds_are_ignored_by_both_backends() {
    let (snapshot, sqlite) = engines(fixtures::mixed_records());

    for (min_price, max_price) in [
        (Some(f64::NAN), None),
        (None, Some(f64::NAN)),
        (Some(f64::NEG_INFINITY), Some(f64::INFINITY)),
        (Some(f64::INFINITY), None),
    ] {
        let query = Query {
            page: 1,
            limit: 20,
            min_price,
            max_price,
            ..Default::default()
        };
        let a = snapshot.execute(&query).unwrap();
        let b = sqlite.execute(&query).unwrap();
        assert_eq!(a.total, 5, "{:?}", query);
        assert_eq!(a, b, "{:?}", query);
    }

    let negative = Query {
        page: 1,
        limit: 20,
        min_price: Some(-1.0),
        max_price: Some(-0.5),
        ..Default::default()
    };
    assert_eq!(snapshot.execute(&negative).unwrap().total, 0);
    assert_eq!(sqlite.execute(&negative).unwrap().total, 0);
}

#[test]
fn test_out_of_range_page_keeps_total() {
    let (snapshot, sqlite) = engines(fixtures::mixed_records());
    for engine in [&snapshot, &sqlite] {
        let result = engine
            .search(QueryRequest {
                page: Some(40),
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 5);
        assert!(result.items.is_empty());
        assert_eq!(result.page, 40);
    }
}

#[test]
fn test_unicode_search_folds_identically() {
    let records = vec![
        fixtures::record("ÉMILE ZOLA", "https://shop.test/a", 5.0, 3, true),
        fixtures::record("émile", "https://shop.test/b", 6.0, 3, true),
        fixtures::record("Emile", "https://shop.test/c", 7.0, 3, true),
    ];
    let (snapshot, sqlite) = engines(records);

    let request = QueryRequest {
        search: Some("Émile".to_string()),
        ..Default::default()
    };
    let a = snapshot.search(request.clone()).unwrap();
    let b = sqlite.search(request).unwrap();
    assert_eq!(a.total, 2);
    assert_eq!(a, b);
}
