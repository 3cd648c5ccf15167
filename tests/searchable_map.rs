use anyhow::{bail, Context};
use searchable_map::{SearchError, SearchableMap};

fn greetings() -> SearchableMap<&'static str> {
    let mut map = SearchableMap::new();
    map.set("hello", "world").set("hell", "yeah").set("ciao", "mondo");
    map
}

fn uni() -> SearchableMap<i32> {
    SearchableMap::from_entries([
        ("unicorn", 1),
        ("universe", 2),
        ("university", 3),
        ("unique", 4),
        ("hello", 5),
    ])
}

#[test]
fn test_fuzzy_hallo() {
    let results = greetings().fuzzy_get("hallo", 2);
    assert_eq!(results.get("hello"), Some((&"world", 1)));
    assert_eq!(results.get("hell"), Some((&"yeah", 2)));
    assert!(!results.contains_key("ciao"));
}

#[test]
fn test_fuzzy_distance_limits() {
    let map = greetings();
    assert!(map.fuzzy_get("hallo", 0).is_empty());
    let one = map.fuzzy_get("hallo", 1);
    assert_eq!(one.keys().collect::<Vec<_>>(), vec!["hello"]);
    let all = map.fuzzy_get("hallo", 10);
    assert_eq!(all.len(), 3);
}

#[test]
fn test_prefix_views() {
    let map = uni();
    let view = map.at_prefix("uni");
    assert_eq!(view.get("unique"), Some(4));
    assert_eq!(view.get("unicorn"), Some(1));
    assert_eq!(view.get("hello"), None);

    let univer = map.at_prefix("univer");
    assert_eq!(univer.get("unique"), None);
    assert_eq!(univer.get("universe"), Some(2));
    assert_eq!(univer.size(), 2);
}

#[test]
fn test_prefix_view_relative_keys() {
    let map = uni();
    for key in ["unicorn", "universe", "university", "unique", "hello"] {
        for cut in 0..=key.len() {
            let (prefix, rest) = key.split_at(cut);
            assert_eq!(map.at_prefix(prefix).get(rest), map.get(key), "{prefix} + {rest}");
        }
    }
}

#[test]
fn test_view_inside_compressed_edge() {
    let map = uni();
    let view = map.at_prefix("univ");
    let entries: Vec<(String, i32)> = view.entries().collect();
    assert_eq!(
        entries,
        vec![("universe".to_string(), 2), ("university".to_string(), 3)]
    );
    assert_eq!(view.get("ersity"), Some(3));
}

#[test]
fn test_fetch_twice() {
    let mut map = SearchableMap::new();
    assert_eq!(map.fetch("k", || 0), 0);
    assert_eq!(map.get("k"), Some(0));
    assert_eq!(map.fetch("k", || 99), 0);
}

#[test]
fn test_fetch_computes_only_on_miss() {
    let mut map = SearchableMap::new();
    let mut calls = 0;
    map.fetch("k", || {
        calls += 1;
        1
    });
    map.fetch("k", || {
        calls += 1;
        2
    });
    assert_eq!(calls, 1);
}

#[test]
fn test_update_through_view() {
    let mut map = SearchableMap::new();
    let mut field = map.at_prefix("title:");
    field.update("rust", |docs: Option<&Vec<u32>>| {
        let mut docs = docs.cloned().unwrap_or_default();
        docs.push(1);
        docs
    });
    field.update("rust", |docs| {
        let mut docs = docs.cloned().unwrap_or_default();
        docs.push(7);
        docs
    });
    assert_eq!(map.get("title:rust"), Some(vec![1, 7]));
    assert_eq!(map.size(), 1);
    map.set("body:rust", vec![2]);
    assert_eq!(field.size(), 1);
}

#[test]
fn test_try_update_with_anyhow() -> anyhow::Result<()> {
    let mut map = SearchableMap::new();
    map.set("port", 8080_u16);

    map.try_update("port", |current| {
        let port = current.copied().context("port missing")?;
        Ok::<_, anyhow::Error>(port + 1)
    })?;
    assert_eq!(map.get("port"), Some(8081));

    let failed = map.try_update("port", |_| -> anyhow::Result<u16> { bail!("rejected") });
    assert_eq!(failed.err().map(|e| e.to_string()), Some("rejected".to_string()));
    assert_eq!(map.get("port"), Some(8081));
    Ok(())
}

#[test]
fn test_delete_missing_is_noop() {
    let mut map = uni();
    assert!(!map.delete("uni"));
    assert!(!map.delete("nothing"));
    assert_eq!(map.size(), 5);
}

#[test]
fn test_overwrite_keeps_size() {
    let mut map = uni();
    map.set("unique", 40);
    assert_eq!(map.size(), 5);
    assert_eq!(map.get("unique"), Some(40));
}

#[test]
fn test_iteration_protocols_agree() {
    let map = uni();
    let entries: Vec<(String, i32)> = map.entries().collect();
    let default: Vec<(String, i32)> = (&map).into_iter().collect();
    let keys: Vec<String> = map.keys().collect();
    let values: Vec<i32> = map.values().collect();

    assert_eq!(entries, default);
    assert_eq!(keys, entries.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>());
    assert_eq!(values, entries.iter().map(|(_, v)| *v).collect::<Vec<_>>());
    assert_eq!(keys, vec!["hello", "unicorn", "unique", "universe", "university"]);
}

#[test]
fn test_negative_distance_is_rejected() {
    let map = uni();
    assert!(matches!(
        map.try_fuzzy_get("uni", -3),
        Err(SearchError::NegativeEditDistance(-3))
    ));
}

#[test]
fn test_from_entries_last_write_wins() {
    let map = SearchableMap::from_entries([("a", 1), ("b", 2), ("a", 3)]);
    assert_eq!(map.size(), 2);
    assert_eq!(map.get("a"), Some(3));
}

#[test]
fn test_per_field_indexes_share_one_tree() {
    let mut index: SearchableMap<Vec<u32>> = SearchableMap::new();
    let mut title = index.at_prefix("title:");
    let mut body = index.at_prefix("body:");
    title.set("rust", vec![1]);
    body.set("rust", vec![1, 2]).set("rusty", vec![3]);

    assert_eq!(index.size(), 3);
    assert_eq!(title.size(), 1);
    assert_eq!(body.size(), 2);

    let matches = body.fuzzy_get("rust", 1);
    assert_eq!(matches.keys().collect::<Vec<_>>(), vec!["body:rust", "body:rusty"]);

    body.clear();
    assert_eq!(index.size(), 1);
    assert_eq!(title.get("rust"), Some(vec![1]));
    index.inspect_tree(|tree| tree.check_invariants()).unwrap();
}
