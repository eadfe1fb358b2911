use std::collections::BTreeMap;

use crate::error::CloudError;

/// Convert a Proxmox stringlist (comma-separated settings) to a map.
///
/// `"setting1=value1,setting2=value2"` becomes
/// `{"setting1": "value1", "setting2": "value2"}`. Entries are trimmed at
/// the edges; spaces inside keys and values persist.
pub fn stringlist_to_dictionary(input: &str) -> Result<BTreeMap<String, String>, CloudError> {
    let mut settings = BTreeMap::new();

    for item in input.split(',') {
        let entry = item.trim();
        if entry.is_empty() {
            continue;
        }

        let mut parts = entry.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => {
                settings.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(CloudError::InvalidValue(format!(
                    "'{entry}' is not a single 'key=value' setting"
                )));
            }
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_stringlist_returns_map() {
        let result = stringlist_to_dictionary("foo=bar,some_key=some_value").unwrap();
        assert_eq!(result.get("foo").unwrap(), "bar");
        assert_eq!(result.get("some_key").unwrap(), "some_value");
    }

    #[test]
    fn empty_stringlist_returns_empty_map() {
        assert!(stringlist_to_dictionary("").unwrap().is_empty());
    }

    #[test]
    fn leading_and_trailing_spaces_are_removed() {
        let result =
            stringlist_to_dictionary("foo=bar, space_before=bar,space_after=bar ").unwrap();
        assert_eq!(result.get("space_before").unwrap(), "bar");
        assert_eq!(result.get("space_after").unwrap(), "bar");
    }

    #[test]
    fn inner_spaces_persist() {
        let result = stringlist_to_dictionary(
            "foo=bar,internal key space=bar,space_in_value= internal value space",
        )
        .unwrap();
        assert_eq!(result.get("internal key space").unwrap(), "bar");
        assert_eq!(result.get("space_in_value").unwrap(), " internal value space");
    }

    #[test]
    fn invalid_entries_are_errors() {
        assert!(stringlist_to_dictionary("foo=bar,foo").is_err());
        assert!(stringlist_to_dictionary("foo=bar,totally=invalid=assignment").is_err());
    }
}
