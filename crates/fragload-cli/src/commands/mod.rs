//! CLI subcommands

pub mod config;
pub mod remote;
pub mod upload;

/// Parses a `key=value` argument
///
/// Only the first `=` separates; the value may contain more of them.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=value: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("album=12").unwrap(),
            ("album".to_string(), "12".to_string())
        );
        assert_eq!(
            parse_key_val("token=a=b").unwrap(),
            ("token".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_val("empty=").unwrap().1, "");
    }

    #[test]
    fn test_parse_key_val_rejects_malformed() {
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=value").is_err());
    }
}
