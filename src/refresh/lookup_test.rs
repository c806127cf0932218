#[cfg(test)]
mod tests {
    use crate::refresh::Lookup;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_hash_map_lookup_by_borrowed_key() {
        let mut m: HashMap<String, u32> = HashMap::new();
        m.insert("a".to_string(), 1);
        assert_eq!(m.lookup("a"), Some(1));
        assert_eq!(m.lookup("b"), None);
    }

    #[test]
    fn test_btree_map_lookup() {
        let mut m = BTreeMap::new();
        m.insert(3u64, "three".to_string());
        assert_eq!(m.lookup(&3), Some("three".to_string()));
        assert_eq!(m.lookup(&4), None);
    }

    #[test]
    fn test_json_lookup_by_field_and_index() {
        let v = json!({"foo": "bar", "list": [1, 2]});
        assert_eq!(v.lookup("foo"), Some(json!("bar")));
        assert_eq!(v.lookup("missing"), None);

        let list = v.lookup("list").unwrap();
        assert_eq!(list.lookup(&1usize), Some(json!(2)));
        assert_eq!(list.lookup(&9usize), None);
    }
}
