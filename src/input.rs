//! Website list parsing

/// Split comma- or newline-separated input into trimmed, non-empty websites.
///
/// Order is preserved and duplicates are kept.
pub fn parse_websites(input: &str) -> Vec<String> {
    input
        .split(['\n', ','])
        .map(str::trim)
        .filter(|website| !website.is_empty())
        .map(str::to_string)
        .collect()
}

/// Placeholder brand name derived from the website's first domain label
///
/// `https://www.acme-labs.com/about` becomes `Acme-labs`.
pub fn stub_brand_name(website: &str) -> String {
    let rest = website
        .strip_prefix("https://")
        .or_else(|| website.strip_prefix("http://"))
        .unwrap_or(website);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let domain = rest.split('/').next().unwrap_or_default();
    let label = domain.split('.').next().unwrap_or_default();

    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        let input = "https://a.com, https://b.com\nhttps://c.com\n\n ,  https://d.com  \n";
        assert_eq!(
            parse_websites(input),
            vec!["https://a.com", "https://b.com", "https://c.com", "https://d.com"]
        );
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        assert_eq!(parse_websites("a.com,a.com"), vec!["a.com", "a.com"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_websites("  \n , \n").is_empty());
    }

    #[test]
    fn test_stub_brand_name() {
        assert_eq!(stub_brand_name("https://www.acme-labs.com/about"), "Acme-labs");
        assert_eq!(stub_brand_name("http://shop.example.org"), "Shop");
        assert_eq!(stub_brand_name("globex.io"), "Globex");
        assert_eq!(stub_brand_name(""), "");
    }
}
