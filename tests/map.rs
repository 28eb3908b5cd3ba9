use chainmap::{
    std_hash, ConfigError, CursorError, DefaultHash, HashFn, HashMap, KeyNotFound, TableConfig,
};
use std::collections::BTreeMap;
use test_log::test;

fn str_hash(s: &&'static str) -> i64 {
    std_hash(s)
}

fn len_hash(s: &String) -> i64 {
    s.len() as i64
}

fn string_hash(s: &String) -> i64 {
    std_hash(s)
}

fn zero(_: &u32) -> i64 {
    0
}

fn ident(k: &u32) -> i64 {
    *k as i64
}

struct ByLen;
impl DefaultHash<String> for ByLen {
    const HASH: Option<HashFn<String>> = Some(len_hash);
}

fn value(m: &HashMap<&'static str, i32>, k: &'static str) -> Option<i32> {
    m.get(&k).map(|v| *v)
}

#[test]
fn overwrite_then_erase_missing() {
    let mut m = HashMap::new(str_hash);
    m.put("a", 1);
    m.put("b", 2);
    m.put("a", 3);
    assert_eq!(m.len(), 2);
    assert_eq!(value(&m, "a"), Some(3));
    assert_eq!(value(&m, "b"), Some(2));
    assert_eq!(m.erase(&"c"), Err(KeyNotFound));
    assert_eq!(m.erase(&"a"), Ok(3));
    assert_eq!(m.len(), 1);
}

#[test]
fn direct_insert_fails_outstanding_cursor() {
    let mut m = HashMap::new(str_hash);
    m.put_all([("a", 1), ("b", 2), ("c", 3)]);
    let mut c = m.cursor();
    m.put("d", 4);
    assert_eq!(c.advance(), Err(CursorError::ConcurrentModification));
    assert_eq!(c.key(), Err(CursorError::ConcurrentModification));
    assert_eq!(c.erase(), Err(CursorError::ConcurrentModification));
}

#[test]
fn erase_at_cursor_then_advance() {
    let mut m = HashMap::new(str_hash);
    m.put_all([("a", 1), ("b", 2), ("c", 3)]);
    let mut c = m.cursor();
    let (gone, _) = c.erase().unwrap();
    assert_eq!(c.value(), Err(CursorError::PositionInvalid));
    assert_eq!(c.erase(), Err(CursorError::AlreadyErased));
    c.advance().unwrap();
    let next = c.key().unwrap();
    assert_ne!(next, gone);
    assert!(m.has_key(&next));
    assert!(!m.has_key(&gone));
}

/// Erasing every even value mid-traversal still visits every key exactly once.
#[test]
fn filtered_erase_during_traversal() {
    let mut m = HashMap::new(ident);
    for k in 0..200u32 {
        m.put(k, k);
    }
    let mut c = m.cursor();
    let mut visited = Vec::new();
    while !c.is_end() {
        let (k, v) = c.entry().unwrap();
        visited.push(k);
        if v % 2 == 0 {
            assert_eq!(c.erase().unwrap(), (k, v));
        }
        c.advance().unwrap();
    }
    visited.sort();
    assert_eq!(visited, (0..200).collect::<Vec<_>>());
    assert_eq!(m.len(), 100);
    assert!((0..200).all(|k| m.has_key(&k) == (k % 2 == 1)));
    assert_eq!(m.bin_lengths().iter().sum::<usize>(), 100);
}

/// Same as above but with every key in one chain.
#[test]
fn filtered_erase_in_single_chain() {
    let cfg = TableConfig::new().hash(zero).load_threshold(64.0);
    let mut m: HashMap<u32, u32> = HashMap::with_config(cfg).unwrap();
    for k in 0..20u32 {
        m.put(k, k);
    }
    assert_eq!(m.bin_count(), 1);
    let mut c = m.cursor();
    let mut visited = 0;
    while !c.is_end() {
        visited += 1;
        if c.key().unwrap() % 3 == 0 {
            c.erase().unwrap();
        }
        c.advance().unwrap();
    }
    assert_eq!(visited, 20);
    assert_eq!(m.len(), 13);
}

#[test]
fn other_cursor_sees_erase_through_cursor() {
    let mut m = HashMap::new(str_hash);
    m.put_all([("a", 1), ("b", 2)]);
    let mut eraser = m.cursor();
    let mut watcher = m.cursor();
    eraser.erase().unwrap();
    assert!(eraser.advance().is_ok());
    assert_eq!(watcher.advance(), Err(CursorError::ConcurrentModification));
}

#[test]
fn equality_ignores_layout() {
    let mut a = HashMap::new(ident);
    for k in 0..32u32 {
        a.put(k, k * 10);
    }
    let cfg = TableConfig::new().hash(ident).initial_bins(13);
    let mut b: HashMap<u32, u32> = HashMap::with_config(cfg).unwrap();
    for k in (0..32u32).rev() {
        b.put(k, k * 10);
    }
    assert_ne!(a.bin_count(), b.bin_count());
    assert_eq!(a, b);
    b.put(5, 0);
    assert_ne!(a, b);
}

#[test]
fn rehash_preserves_every_value() {
    let mut m = HashMap::new(ident);
    for k in 0..1000u32 {
        m.put(k, k + 1);
        assert!(m.len() as f64 / m.bin_count() as f64 <= m.load_threshold());
    }
    assert!(m.bin_count() >= 1000);
    assert!((0..1000u32).all(|k| m.get(&k).map(|v| *v) == Some(k + 1)));
}

#[test]
fn clear_resets_threshold_and_bins() {
    let cfg = TableConfig::new().hash(ident).load_threshold(3.0).initial_bins(16);
    let mut m: HashMap<u32, ()> = HashMap::with_config(cfg).unwrap();
    for k in 0..40 {
        m.put(k, ());
    }
    let mut c = m.cursor();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.bin_count(), 1);
    assert_eq!(m.load_threshold(), 1.0);
    assert_eq!(c.advance(), Err(CursorError::ConcurrentModification));
    m.put(7, ());
    assert!(m.has_key(&7));
}

#[test]
fn overwrite_does_not_invalidate_cursor() {
    let mut m = HashMap::new(str_hash);
    m.put_all([("a", 1), ("b", 2)]);
    let mut c = m.cursor();
    m.put("a", 100);
    m.put("b", 200);
    let mut seen = BTreeMap::new();
    while !c.is_end() {
        let (k, v) = c.entry().unwrap();
        seen.insert(k, v);
        c.advance().unwrap();
    }
    assert_eq!(seen, BTreeMap::from([("a", 100), ("b", 200)]));
}

#[test]
fn configuration_errors() {
    let missing = HashMap::<u32, u32>::with_config(TableConfig::new());
    assert!(matches!(missing, Err(ConfigError::MissingHashFunction)));

    let conflict = HashMap::<String, u32, ByLen>::with_config(TableConfig::new().hash(string_hash));
    assert!(matches!(conflict, Err(ConfigError::ConflictingHashFunctions)));

    let agree = HashMap::<String, u32, ByLen>::with_config(TableConfig::new().hash(len_hash));
    assert!(agree.is_ok());

    let bad = HashMap::<u32, u32>::with_config(TableConfig::new().hash(ident).load_threshold(0.0));
    assert!(matches!(bad, Err(ConfigError::InvalidLoadThreshold)));
}

#[test]
fn copy_with_hash_checks_type_default() {
    let mut m = HashMap::<String, u32, ByLen>::with_default().unwrap();
    m.put("abc".to_string(), 1);
    m.put("de".to_string(), 2);

    let conflict = m.clone_with_hash(string_hash);
    assert!(matches!(conflict, Err(ConfigError::ConflictingHashFunctions)));

    let same = m.clone_with_hash(len_hash).unwrap();
    assert_eq!(same.hash_fn() as usize, len_hash as usize);
    assert_eq!(same, m);
    assert_eq!(same.bin_lengths(), m.bin_lengths());
}

#[test]
fn unreachable_threshold_is_rejected() {
    let tiny = HashMap::<u32, u32>::with_config(TableConfig::new().hash(ident).load_threshold(1e-300));
    assert!(matches!(tiny, Err(ConfigError::InvalidLoadThreshold)));
}

/// A small but valid threshold grows to the bins one entry needs in one step.
#[test]
fn small_threshold_grows_on_first_insert() {
    let cfg = TableConfig::new().hash(ident).load_threshold(1e-3);
    let mut m: HashMap<u32, u32> = HashMap::with_config(cfg).unwrap();
    m.put(1, 1);
    assert_eq!(m.bin_count(), 1024);
    assert!(m.len() as f64 / m.bin_count() as f64 <= m.load_threshold());
    assert_eq!(m.get(&1).map(|v| *v), Some(1));
}

#[test]
fn type_default_hash_places_by_length() {
    let cfg = TableConfig::new().initial_bins(8).load_threshold(8.0);
    let mut m = HashMap::<String, u32, ByLen>::with_config(cfg).unwrap();
    for w in ["a", "bb", "cc", "ddd"] {
        m.put(w.to_string(), 0);
    }
    assert_eq!(m.bin_lengths(), vec![0, 1, 2, 1, 0, 0, 0, 0]);
}

#[test]
fn from_entries_sizes_bins_from_hint() {
    let pairs: Vec<(u32, u32)> = (0..10).map(|k| (k, k)).collect();
    let m = HashMap::<u32, u32>::from_entries(pairs, TableConfig::new().hash(ident)).unwrap();
    assert_eq!(m.len(), 10);
    assert!(m.bin_count() >= 10);
    assert_eq!(m.bin_lengths().iter().sum::<usize>(), 10);
}

#[test]
fn copies_and_assignment() {
    let mut src = HashMap::new(ident);
    src.put_all((0..9u32).map(|k| (k, k)));

    let same = src.clone();
    assert_eq!(same.bin_lengths(), src.bin_lengths());
    assert_eq!(same, src);

    let rehashed = src.clone_with_hash(zero).unwrap();
    assert_eq!(rehashed, src);
    assert_eq!(rehashed.bin_lengths()[0], 9);

    let mut dst = HashMap::new(zero);
    dst.put(100, 100);
    let mut c = dst.cursor();
    dst.assign_from(&src);
    assert_eq!(dst, src);
    assert!(!dst.has_key(&100));
    assert_eq!(c.advance(), Err(CursorError::ConcurrentModification));
}

#[test]
fn cursor_positions() {
    let mut m = HashMap::new(str_hash);
    m.put_all([("a", 1), ("b", 2)]);
    let other: HashMap<&'static str, i32> = HashMap::new(str_hash);

    assert_eq!(m.cursor().same_position(&m.cursor()), Ok(true));
    assert_eq!(m.end().same_position(&m.end()), Ok(true));
    assert_eq!(m.cursor().same_position(&m.end()), Ok(false));
    assert_eq!(
        m.cursor().same_position(&other.end()),
        Err(CursorError::IncomparableIterators)
    );

    let mut c = m.cursor();
    c.advance().unwrap();
    c.advance().unwrap();
    assert!(c.is_end());
    assert_eq!(c.same_position(&m.end()), Ok(true));
    assert_eq!(c.advance(), Ok(()));
    assert_eq!(c.erase(), Err(CursorError::PastEnd));
    assert_eq!(c.key(), Err(CursorError::PositionInvalid));
}

#[test]
fn cursor_keeps_storage_alive() {
    let c = {
        let mut m = HashMap::new(str_hash);
        m.put("only", 1);
        m.cursor()
    };
    assert_eq!(c.entry(), Ok(("only", 1)));
}

#[test]
fn word_count_with_index_or_insert() {
    let mut m = HashMap::new(str_hash);
    for w in "a b a c b a".split(' ') {
        *m.get_or_insert_default(w) += 1;
    }
    assert_eq!(value(&m, "a"), Some(3));
    assert_eq!(value(&m, "b"), Some(2));
    assert_eq!(value(&m, "c"), Some(1));
    let mut pairs = m.to_vec();
    pairs.sort();
    assert_eq!(pairs, vec![("a", 3), ("b", 2), ("c", 1)]);
}

#[test]
fn extend_and_display() {
    let mut m = HashMap::new(str_hash);
    m.extend([("k", 1)]);
    assert_eq!(m.to_string(), "map[k->1]");
    assert!(m.layout().contains("\"k\""));
}
