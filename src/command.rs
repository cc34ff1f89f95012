//! Input classification: one trimmed line (or an accumulated statement) in,
//! one [`Command`] out. Pure, no I/O.

use regex::Regex;
use std::sync::LazyLock;

/// A classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// `\c [name]`. `None` when no identifier could be parsed after `\c`;
    /// that is treated as a confirmation of the current database.
    ConnectTo(Option<String>),
    ListDatabases,
    ListTablesWithCounts,
    DescribeTable(String),
    ListTables,
    ToggleExpanded,
    Help,
    RawQuery(String),
    Empty,
    Unrecognized(String),
}

static CONNECT_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\\c\s+([A-Za-z0-9_-]+)").expect("valid regex"));

/// Classify an input line. Rules are checked in priority order; some command
/// prefixes overlap (`\d+` is also a prefix match for `\d`), so the order is
/// load-bearing.
pub fn classify(input: &str) -> Command {
    let line = input.trim();

    if line.is_empty() {
        return Command::Empty;
    }
    if line.starts_with("\\q") {
        return Command::Quit;
    }
    if line.starts_with("\\c") {
        let target = CONNECT_TARGET
            .captures(line)
            .map(|caps| caps[1].to_string());
        return Command::ConnectTo(target);
    }
    if line.starts_with("\\l") {
        return Command::ListDatabases;
    }
    // `\d+` has to win before the plain `\d` prefix check.
    if line.starts_with("\\d+") {
        return Command::ListTablesWithCounts;
    }
    if let Some(rest) = line.strip_prefix("\\d") {
        let table = rest.trim().trim_end_matches(';').trim();
        return if table.is_empty() {
            Command::ListTables
        } else {
            Command::DescribeTable(table.to_string())
        };
    }
    if line.starts_with("\\x") {
        return Command::ToggleExpanded;
    }
    if line.starts_with("\\h") {
        return Command::Help;
    }
    if line.ends_with(';') {
        return Command::RawQuery(line.to_string());
    }
    Command::Unrecognized(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Command::Empty)]
    #[case("   ", Command::Empty)]
    #[case("\\q", Command::Quit)]
    #[case("\\quit", Command::Quit)]
    #[case("\\l", Command::ListDatabases)]
    #[case("\\l;", Command::ListDatabases)]
    #[case("\\d+", Command::ListTablesWithCounts)]
    #[case("\\d", Command::ListTables)]
    #[case("\\d;", Command::ListTables)]
    #[case("\\x", Command::ToggleExpanded)]
    #[case("\\h", Command::Help)]
    fn classifies_meta_commands(#[case] input: &str, #[case] expected: Command) {
        assert_eq!(classify(input), expected);
    }

    #[rstest]
    #[case("\\c appdb", Some("appdb"))]
    #[case("\\c  app-db_2", Some("app-db_2"))]
    #[case("\\c", None)]
    #[case("\\c !!!", None)]
    fn extracts_connect_target(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            classify(input),
            Command::ConnectTo(expected.map(str::to_string))
        );
    }

    #[test]
    fn describe_strips_prefix_and_terminator() {
        assert_eq!(
            classify("\\d users;"),
            Command::DescribeTable("users".to_string())
        );
        assert_eq!(
            classify("\\d users"),
            Command::DescribeTable("users".to_string())
        );
    }

    #[test]
    fn counts_listing_wins_over_describe() {
        // `\d+` must never fall through to the `\d` arm.
        assert_eq!(classify("\\d+"), Command::ListTablesWithCounts);
        assert_eq!(classify("\\d+;"), Command::ListTablesWithCounts);
    }

    #[test]
    fn terminated_text_is_a_raw_query() {
        assert_eq!(
            classify("select 1;"),
            Command::RawQuery("select 1;".to_string())
        );
        assert_eq!(
            classify("select *\nfrom users\nwhere id = 1;"),
            Command::RawQuery("select *\nfrom users\nwhere id = 1;".to_string())
        );
    }

    #[test]
    fn unterminated_text_is_unrecognized() {
        assert_eq!(
            classify("select 1"),
            Command::Unrecognized("select 1".to_string())
        );
        assert_eq!(
            classify("\\zz"),
            Command::Unrecognized("\\zz".to_string())
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for input in ["\\d+", "\\c appdb", "select 1;", "nonsense"] {
            assert_eq!(classify(input), classify(input));
        }
    }
}
