use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Deserialize)]
struct ReadingsConfig {
    readings: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("key must be a single character: {0:?}")]
    NotSingleChar(String),
    #[error("empty reading for key: {0}")]
    EmptyValue(String),
    #[error("reading for {key} must be lowercase ASCII letters or digits: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transliterator already initialized")]
    AlreadyInitialized,
}

/// Parse TOML text into a sorted `BTreeMap<char, reading>`.
pub fn parse_readings_toml(toml_str: &str) -> Result<BTreeMap<char, String>, ReadingsError> {
    let config: ReadingsConfig =
        toml::from_str(toml_str).map_err(|e| ReadingsError::Parse(e.to_string()))?;

    let mut readings = BTreeMap::new();
    for (key, value) in config.readings {
        let mut chars = key.chars();
        let ch = match (chars.next(), chars.next()) {
            (Some(ch), None) => ch,
            _ => return Err(ReadingsError::NotSingleChar(key)),
        };
        if value.is_empty() {
            return Err(ReadingsError::EmptyValue(key));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ReadingsError::InvalidValue { key, value });
        }
        readings.insert(ch, value);
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_toml() {
        let toml = r#"
[readings]
"重" = "zhong"
"行" = "xing"
"#;
        let map = parse_readings_toml(toml).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&'重'], "zhong");
        assert_eq!(map[&'行'], "xing");
    }

    #[test]
    fn parse_default_toml() {
        let map = parse_readings_toml(super::super::DEFAULT_READINGS_TOML).unwrap();
        assert!(!map.is_empty());
        assert_eq!(map[&'〇'], "ling");
    }

    #[test]
    fn empty_table_is_allowed() {
        let map = parse_readings_toml("[readings]\n").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn error_multi_char_key() {
        let toml = r#"
[readings]
"北京" = "beijing"
"#;
        let err = parse_readings_toml(toml).unwrap_err();
        assert!(matches!(err, ReadingsError::NotSingleChar(_)));
    }

    #[test]
    fn error_empty_value() {
        let toml = r#"
[readings]
"重" = ""
"#;
        let err = parse_readings_toml(toml).unwrap_err();
        assert!(matches!(err, ReadingsError::EmptyValue(_)));
    }

    #[test]
    fn error_toned_value() {
        let toml = r#"
[readings]
"重" = "zhòng"
"#;
        let err = parse_readings_toml(toml).unwrap_err();
        assert!(matches!(err, ReadingsError::InvalidValue { .. }));
    }

    #[test]
    fn error_invalid_toml() {
        let err = parse_readings_toml("not valid toml {{{").unwrap_err();
        assert!(matches!(err, ReadingsError::Parse(_)));
    }
}
