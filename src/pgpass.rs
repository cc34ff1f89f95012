//! PostgreSQL password file (`.pgpass`) lookup.
//!
//! Entries are `host:port:database:user:password`, with `*` wildcards and
//! backslash-escaped `:` and `\` inside fields. The file is honored only when
//! its permissions are 0600 on Unix, matching libpq behavior.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgpassEntry {
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

/// Location of the password file: `$PGPASSFILE`, else `~/.pgpass` on Unix or
/// `%APPDATA%\postgresql\pgpass.conf` on Windows.
pub fn passfile_path() -> Option<PathBuf> {
    if let Ok(passfile) = env::var("PGPASSFILE") {
        return Some(PathBuf::from(passfile));
    }

    #[cfg(target_family = "unix")]
    {
        dirs::home_dir().map(|home| home.join(".pgpass"))
    }

    #[cfg(target_family = "windows")]
    {
        env::var_os("APPDATA")
            .map(|appdata| PathBuf::from(appdata).join("postgresql").join("pgpass.conf"))
    }
}

fn has_safe_permissions(path: &Path) -> bool {
    #[cfg(target_family = "unix")]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions().mode() & 0o077 == 0,
            Err(_) => false,
        }
    }

    #[cfg(target_family = "windows")]
    {
        let _ = path;
        true
    }
}

/// Parse one line. Comments, blank lines and lines without exactly five
/// fields yield `None`.
fn parse_line(line: &str) -> Option<PgpassEntry> {
    if line.starts_with('#') || line.trim().is_empty() {
        return None;
    }

    let mut fields: Vec<String> = Vec::with_capacity(5);
    let mut current = String::new();
    let mut escaping = false;

    for c in line.chars() {
        if escaping {
            current.push(c);
            escaping = false;
        } else if c == '\\' {
            escaping = true;
        } else if c == ':' && fields.len() < 4 {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    if fields.len() != 5 {
        return None;
    }

    let mut it = fields.into_iter();
    Some(PgpassEntry {
        host: it.next()?,
        port: it.next()?,
        database: it.next()?,
        user: it.next()?,
        password: it.next()?,
    })
}

fn matches(entry: &PgpassEntry, host: &str, port: u16, database: &str, user: &str) -> bool {
    (entry.host == "*" || entry.host == host)
        && (entry.port == "*" || entry.port == port.to_string())
        && (entry.database == "*" || entry.database == database)
        && (entry.user == "*" || entry.user == user)
}

/// First matching password in `path`, if any.
pub fn lookup_in_file(
    path: &Path,
    host: &str,
    port: u16,
    database: &str,
    user: &str,
) -> Option<String> {
    if !path.exists() {
        return None;
    }
    if !has_safe_permissions(path) {
        eprintln!(
            "Warning: password file {} has group or world access; ignoring it (chmod 0600 to use it).",
            path.display()
        );
        return None;
    }

    let reader = BufReader::new(File::open(path).ok()?);
    for line in reader.lines() {
        let line = line.ok()?;
        if let Some(entry) = parse_line(&line) {
            if matches(&entry, host, port, database, user) {
                return Some(entry.password);
            }
        }
    }
    None
}

/// Look up a password in the default password file.
pub fn lookup(host: &str, port: u16, database: &str, user: &str) -> Option<String> {
    lookup_in_file(&passfile_path()?, host, port, database, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_plain_entry() {
        let entry = parse_line("localhost:5432:appdb:alice:hunter2").unwrap();
        assert_eq!(entry.host, "localhost");
        assert_eq!(entry.port, "5432");
        assert_eq!(entry.database, "appdb");
        assert_eq!(entry.user, "alice");
        assert_eq!(entry.password, "hunter2");
    }

    #[test]
    fn handles_escaped_separators() {
        let entry = parse_line(r"localhost:5432:odd\:db:alice:pa\\ss").unwrap();
        assert_eq!(entry.database, "odd:db");
        assert_eq!(entry.password, r"pa\ss");
    }

    #[test]
    fn rejects_comments_and_malformed_lines() {
        assert_eq!(parse_line("# a comment"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("only:three:fields"), None);
    }

    #[test]
    fn wildcards_match_any_value() {
        let entry = parse_line("*:*:*:alice:pw").unwrap();
        assert!(matches(&entry, "db.example.com", 5433, "whatever", "alice"));
        assert!(!matches(&entry, "db.example.com", 5433, "whatever", "bob"));
    }

    #[cfg(target_family = "unix")]
    #[test]
    fn lookup_respects_permissions_and_order() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgpass");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "# test entries").unwrap();
        writeln!(file, "localhost:5432:appdb:alice:first").unwrap();
        writeln!(file, "*:*:*:alice:fallback").unwrap();
        drop(file);

        // World-readable file must be ignored.
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(lookup_in_file(&path, "localhost", 5432, "appdb", "alice"), None);

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(
            lookup_in_file(&path, "localhost", 5432, "appdb", "alice"),
            Some("first".to_string())
        );
        assert_eq!(
            lookup_in_file(&path, "other", 5432, "otherdb", "alice"),
            Some("fallback".to_string())
        );
        assert_eq!(lookup_in_file(&path, "other", 5432, "otherdb", "bob"), None);
    }
}
