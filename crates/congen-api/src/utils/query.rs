//! Raw query string helpers

use percent_encoding::percent_decode_str;

/// Every value of a repeated query parameter, in order.
///
/// Accepts `key=a&key=b` and `key[]=a&key[]=b`; key comparison ignores ASCII case.
/// Empty values are dropped.
pub fn repeated_values(query: Option<&str>, key: &str) -> Vec<String> {
    let Some(query) = query else {
        return Vec::new();
    };

    query
        .split('&')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = decode(name);
            let name = name.strip_suffix("[]").unwrap_or(&name);
            if name.eq_ignore_ascii_case(key) {
                Some(decode(value))
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty())
        .collect()
}

fn decode(component: &str) -> String {
    let component = component.replace('+', " ");
    percent_decode_str(&component)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_values_keep_order() {
        let values = repeated_values(Some("fileNames=b.txt&other=1&fileNames=a.txt"), "fileNames");
        assert_eq!(values, vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn test_bracket_and_case_variants() {
        let values = repeated_values(
            Some("filenames%5B%5D=a.txt&fileNames[]=b.txt&FILENAMES=c.txt"),
            "fileNames",
        );
        assert_eq!(values, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_decoding_and_empty_values() {
        let values = repeated_values(Some("fileNames=my+file%2Ev1.txt&fileNames="), "fileNames");
        assert_eq!(values, vec!["my file.v1.txt"]);
        assert!(repeated_values(None, "fileNames").is_empty());
    }
}
