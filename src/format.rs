//! Terminal rendering of command outcomes.
//!
//! Column widths are computed from terminal display width, not byte length,
//! so multi-byte and wide (CJK) characters keep the table aligned. All output
//! goes out as UTF-8 bytes independent of the host code page.

use crate::executor::CommandOutcome;
use crate::schema::TableDetails;
use nu_ansi_term::Color;
use prettytable::{Cell, Row as PtRow, Table};
use std::io::Write;
use textwrap::core::display_width;

/// Pad `text` to `width` terminal columns.
fn pad(text: &str, width: usize, left_align: bool) -> String {
    let current = display_width(text);
    if current >= width {
        return text.to_string();
    }
    let padding = " ".repeat(width - current);
    if left_align {
        format!("{text}{padding}")
    } else {
        format!("{padding}{text}")
    }
}

fn looks_numeric(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
}

/// psql-style aligned table with a `(N rows)` footer.
pub fn format_rows_psql(columns: &[String], rows: &[Vec<String>], row_count: usize) -> String {
    if columns.is_empty() {
        return "Query OK, no results.\n".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| display_width(c)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(display_width(cell));
            }
        }
    }

    let mut out = String::new();

    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        out.push_str(&pad(column, widths[i], true));
    }
    out.push('\n');

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push_str("-+-");
        }
        out.push_str(&"-".repeat(*width));
    }
    out.push('\n');

    for row in rows {
        for i in 0..columns.len() {
            if i > 0 {
                out.push_str(" | ");
            }
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            out.push_str(&pad(cell, widths[i], !looks_numeric(cell)));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "({} {})\n",
        row_count,
        if row_count == 1 { "row" } else { "rows" }
    ));
    out
}

/// Expanded display: one vertical table per record.
pub fn format_rows_expanded(columns: &[String], rows: &[Vec<String>]) -> Vec<Table> {
    let mut tables = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let mut table = Table::new();
        table.add_row(PtRow::new(vec![
            Cell::new(&format!("Record {}", i + 1)),
            Cell::new(""),
        ]));
        for (col_idx, column) in columns.iter().enumerate() {
            let value = row.get(col_idx).map(String::as_str).unwrap_or("");
            table.add_row(PtRow::new(vec![Cell::new(column), Cell::new(value)]));
        }
        tables.push(table);
    }
    tables
}

pub fn format_single_column(values: &[String]) -> String {
    values.join(", ")
}

/// Human-readable schema layout for `\d <name>`.
pub fn format_table_details(details: &TableDetails) -> String {
    let mut out = String::new();
    out.push_str(&format!("Table \"{}.{}\"\n", details.schema, details.name));

    let headers = ["Column", "Type", "Collation", "Nullable", "Default"];
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for col in &details.columns {
        widths[0] = widths[0].max(display_width(&col.name));
        widths[1] = widths[1].max(display_width(&col.data_type));
        widths[2] = widths[2].max(display_width(&col.collation));
        widths[3] = widths[3].max(if col.nullable { 0 } else { "not null".len() });
        widths[4] = widths[4].max(
            col.default_value
                .as_deref()
                .map(display_width)
                .unwrap_or(0),
        );
    }

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        out.push_str(&pad(header, widths[i], true));
    }
    out.push('\n');
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push_str("-+-");
        }
        out.push_str(&"-".repeat(*width));
    }
    out.push('\n');

    for col in &details.columns {
        let nullable = if col.nullable { "" } else { "not null" };
        let default = col.default_value.as_deref().unwrap_or("");
        let cells = [
            col.name.as_str(),
            col.data_type.as_str(),
            col.collation.as_str(),
            nullable,
            default,
        ];
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            out.push_str(&pad(cell, widths[i], true));
        }
        out.push('\n');
    }

    if !details.indexes.is_empty() {
        out.push_str("Indexes:\n");
        for idx in &details.indexes {
            // `pg_get_indexdef` output starts with "CREATE [UNIQUE] INDEX ...
            // USING"; the part after USING carries the method and columns.
            let def = idx
                .definition
                .split_once(" USING ")
                .map_or(idx.definition.as_str(), |(_, def)| def.trim());

            let mut line = if idx.is_primary {
                format!("    \"{}\" PRIMARY KEY, {}", idx.name, def)
            } else if idx.is_unique {
                format!("    \"{}\" UNIQUE, {}", idx.name, def)
            } else {
                format!("    \"{}\" {}", idx.name, def)
            };
            if let Some(pred) = &idx.predicate {
                line.push_str(&format!(" WHERE {pred}"));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }

    if !details.foreign_keys.is_empty() {
        out.push_str("Foreign-key constraints:\n");
        for fk in &details.foreign_keys {
            out.push_str(&format!("    \"{}\" {}\n", fk.name, fk.definition));
        }
    }

    out
}

/// Write `text` to stdout as raw UTF-8 bytes and flush, so output stays
/// byte-correct even on terminals with non-UTF-8 default code pages.
fn emit(text: &str) {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let _ = lock.write_all(text.as_bytes());
    let _ = lock.flush();
}

/// Render one outcome to the terminal. Side effect only.
pub fn render(outcome: &CommandOutcome, expanded: bool) {
    match outcome {
        CommandOutcome::Rows {
            columns,
            rows,
            row_count,
        } => {
            if expanded && !columns.is_empty() {
                let mut buffer = String::new();
                for table in format_rows_expanded(columns, rows) {
                    buffer.push_str(&table.to_string());
                }
                buffer.push_str(&format!(
                    "({} {})\n",
                    row_count,
                    if *row_count == 1 { "row" } else { "rows" }
                ));
                emit(&buffer);
            } else {
                emit(&format_rows_psql(columns, rows, *row_count));
            }
        }
        CommandOutcome::SingleColumnSummary(values) => {
            emit(&format!("{}\n", format_single_column(values)));
        }
        CommandOutcome::StatusMessage(text) => {
            if !text.is_empty() {
                emit(&format!("{text}\n"));
            }
        }
        CommandOutcome::SchemaText(text) => {
            emit(&format!("{text}\n"));
        }
        CommandOutcome::NotFound(name) => {
            emit(&format!("Did not find any relation named \"{name}\".\n"));
        }
        CommandOutcome::ExecutionError { query, message } => {
            eprintln!("{}", Color::Red.paint(format!("Error: {message}")));
            eprintln!("Query: {query}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnInfo, ForeignKeyInfo, IndexInfo};

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn psql_table_aligns_and_counts() {
        let out = format_rows_psql(
            &columns(&["id", "name"]),
            &[
                vec!["1".to_string(), "alice".to_string()],
                vec!["2".to_string(), "bob".to_string()],
            ],
            2,
        );
        assert!(out.contains("id | name"));
        assert!(out.contains("---+"));
        assert!(out.ends_with("(2 rows)\n"));
    }

    #[test]
    fn single_row_footer_is_singular() {
        let out = format_rows_psql(&columns(&["n"]), &[vec!["1".to_string()]], 1);
        assert!(out.ends_with("(1 row)\n"));
    }

    #[test]
    fn wide_characters_do_not_break_alignment() {
        let out = format_rows_psql(
            &columns(&["name", "city"]),
            &[
                vec!["山田太郎".to_string(), "東京".to_string()],
                vec!["bob".to_string(), "paris".to_string()],
            ],
            2,
        );
        // "山田太郎" occupies 8 terminal columns; every data row must reach
        // the same separator offset.
        let lines: Vec<&str> = out.lines().collect();
        let sep_positions: Vec<usize> = lines
            .iter()
            .filter(|l| l.contains(" | "))
            .map(|l| {
                l.char_indices()
                    .find(|(_, c)| *c == '|')
                    .map(|(i, _)| display_width(&l[..i]))
                    .unwrap()
            })
            .collect();
        assert!(sep_positions.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn empty_result_is_a_status_line() {
        assert_eq!(format_rows_psql(&[], &[], 0), "Query OK, no results.\n");
    }

    #[test]
    fn numeric_cells_right_align() {
        let out = format_rows_psql(
            &columns(&["count"]),
            &[vec!["7".to_string()]],
            1,
        );
        assert!(out.contains("    7"));
    }

    #[test]
    fn single_column_summary_is_comma_joined() {
        let values = vec!["postgres".to_string(), "app".to_string()];
        assert_eq!(format_single_column(&values), "postgres, app");
    }

    #[test]
    fn expanded_display_yields_one_table_per_record() {
        let tables = format_rows_expanded(
            &columns(&["a", "b"]),
            &[
                vec!["1".to_string(), "x".to_string()],
                vec!["2".to_string(), "y".to_string()],
            ],
        );
        assert_eq!(tables.len(), 2);
        assert!(tables[0].to_string().contains("Record 1"));
        assert!(tables[1].to_string().contains("Record 2"));
    }

    #[test]
    fn table_details_render_sections() {
        let details = TableDetails {
            schema: "public".to_string(),
            name: "users".to_string(),
            columns: vec![
                ColumnInfo {
                    name: "id".to_string(),
                    data_type: "bigint".to_string(),
                    collation: String::new(),
                    nullable: false,
                    default_value: Some("nextval('users_id_seq')".to_string()),
                },
                ColumnInfo {
                    name: "email".to_string(),
                    data_type: "text".to_string(),
                    collation: String::new(),
                    nullable: true,
                    default_value: None,
                },
            ],
            indexes: vec![IndexInfo {
                name: "users_pkey".to_string(),
                is_primary: true,
                is_unique: true,
                predicate: None,
                definition: "CREATE UNIQUE INDEX users_pkey ON public.users USING btree (id)"
                    .to_string(),
            }],
            foreign_keys: vec![ForeignKeyInfo {
                name: "users_org_fkey".to_string(),
                definition: "FOREIGN KEY (org_id) REFERENCES orgs(id)".to_string(),
            }],
        };

        let out = format_table_details(&details);
        assert!(out.starts_with("Table \"public.users\"\n"));
        assert!(out.contains("not null"));
        assert!(out.contains("Indexes:"));
        assert!(out.contains("\"users_pkey\" PRIMARY KEY, btree (id)"));
        assert!(out.contains("Foreign-key constraints:"));
        assert!(out.contains("users_org_fkey"));
    }
}
