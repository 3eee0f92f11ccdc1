use serde::{Deserialize, Deserializer};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// `(page, page_size)` with defaults; bounds are checked by the DAO layer.
pub fn page_params(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
}

/// Absent stays `None`, explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{nullable, page_params};

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        description: Option<Option<String>>,
    }

    #[test]
    fn nullable_distinguishes_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").expect("json should parse");
        let cleared: Patch =
            serde_json::from_str(r#"{"description":null}"#).expect("json should parse");
        let set: Patch = serde_json::from_str(r#"{"description":"x"}"#).expect("json should parse");

        assert_eq!(missing.description, None);
        assert_eq!(cleared.description, Some(None));
        assert_eq!(set.description, Some(Some("x".to_string())));
    }

    #[test]
    fn page_defaults() {
        assert_eq!(page_params(None, None), (1, 20));
        assert_eq!(page_params(Some(3), Some(5)), (3, 5));
    }
}
