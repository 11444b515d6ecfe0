use std::fmt;

/// How the configured spreadsheet identifier is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetTarget {
    Url(String),
    Name(String),
}

impl SheetTarget {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.starts_with("http://") || input.starts_with("https://") {
            SheetTarget::Url(input.to_string())
        } else {
            SheetTarget::Name(input.to_string())
        }
    }

    /// Spreadsheet key embedded in a `/spreadsheets/d/<key>/...` URL.
    pub fn spreadsheet_key(&self) -> Option<&str> {
        let SheetTarget::Url(url) = self else {
            return None;
        };
        let (_, rest) = url.split_once("/spreadsheets/d/")?;
        let key = rest
            .split(|c| c == '/' || c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        (!key.is_empty()).then_some(key)
    }
}

impl fmt::Display for SheetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetTarget::Url(url) => write!(f, "{url}"),
            SheetTarget::Name(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_urls_from_names() {
        assert_eq!(
            SheetTarget::parse("https://docs.google.com/spreadsheets/d/abc/edit"),
            SheetTarget::Url("https://docs.google.com/spreadsheets/d/abc/edit".to_string())
        );
        assert_eq!(
            SheetTarget::parse("http://example.com/x"),
            SheetTarget::Url("http://example.com/x".to_string())
        );
        assert_eq!(
            SheetTarget::parse("庫存表"),
            SheetTarget::Name("庫存表".to_string())
        );
    }

    #[test]
    fn spreadsheet_key_is_extracted_from_edit_url() {
        let target = SheetTarget::parse(
            "https://docs.google.com/spreadsheets/d/1scyPr63TYfvHrHGECVVn1krCnur2z0rrwR1OijCzfdY/edit?gid=0#gid=0",
        );
        assert_eq!(
            target.spreadsheet_key(),
            Some("1scyPr63TYfvHrHGECVVn1krCnur2z0rrwR1OijCzfdY")
        );
        assert_eq!(
            SheetTarget::parse("https://docs.google.com/spreadsheets/d/k1").spreadsheet_key(),
            Some("k1")
        );
    }

    #[test]
    fn spreadsheet_key_missing_for_names_and_foreign_urls() {
        assert_eq!(SheetTarget::parse("庫存表").spreadsheet_key(), None);
        assert_eq!(
            SheetTarget::parse("https://example.com/other").spreadsheet_key(),
            None
        );
        assert_eq!(
            SheetTarget::parse("https://docs.google.com/spreadsheets/d/").spreadsheet_key(),
            None
        );
    }
}
