//! Output rendering: a JSON array or a plain columnar table.

use std::collections::HashSet;
use std::io::Write;

use serde_json::Value;

use crate::schema::FlatRecord;
use crate::Result;

const INDEX_HEADER: &str = "(index)";
const COLUMN_GAP: &str = "  ";

/// How rows are written to the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Write `rows` in the given format. Table cells longer than
/// `max_cell_width` characters are truncated (0 disables truncation).
pub fn render<W: Write>(
    rows: &[FlatRecord],
    format: OutputFormat,
    max_cell_width: usize,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Json => render_json(rows, out),
        OutputFormat::Table => render_table(rows, max_cell_width, out),
    }
}

/// One JSON array on a single line; each record keeps its field order.
pub fn render_json<W: Write>(rows: &[FlatRecord], out: &mut W) -> Result<()> {
    serde_json::to_writer(&mut *out, rows)?;
    writeln!(out)?;
    Ok(())
}

/// An `(index)` column followed by one column per distinct field name, in
/// the order names are first seen across all rows.
pub fn render_table<W: Write>(rows: &[FlatRecord], max_cell_width: usize, out: &mut W) -> Result<()> {
    let mut seen = HashSet::new();
    let columns: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.names())
        .filter(|name| seen.insert(*name))
        .collect();

    let header: Vec<String> = std::iter::once(INDEX_HEADER.to_string())
        .chain(columns.iter().map(|c| truncate(c, max_cell_width)))
        .collect();

    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            std::iter::once(i.to_string())
                .chain(columns.iter().map(|c| {
                    row.get(c)
                        .map(|v| truncate(&cell_text(v), max_cell_width))
                        .unwrap_or_default()
                }))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &body {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_line(out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(out, &rule, &widths)?;
    for line in &body {
        write_line(out, line, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    writeln!(out, "{}", line.join(COLUMN_GAP).trim_end())?;
    Ok(())
}

/// Display text of a cell: strings verbatim, everything else as compact JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.replace(['\n', '\r', '\t'], " "),
        other => other.to_string(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if max_chars == 0 || s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars - 1).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FlatRecord {
        match value {
            Value::Object(map) => FlatRecord::from(map),
            other => panic!("expected object, got {}", other),
        }
    }

    fn table(rows: &[FlatRecord], max: usize) -> String {
        let mut out = Vec::new();
        render(rows, OutputFormat::Table, max, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_json_is_single_line_array_in_field_order() {
        let rows = vec![record(json!({"z": 1, "a": "x"})), record(json!({"b": null}))];
        let mut out = Vec::new();
        render(&rows, OutputFormat::Json, 0, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "[{\"z\":1,\"a\":\"x\"},{\"b\":null}]\n");
    }

    #[test]
    fn test_json_reparses_to_same_values() {
        let rows = vec![
            record(json!({"ts": 1700000000, "time": "2023-11-14T22:13:20.000Z", "key": ["logs", 1]})),
            record(json!({"headers": {"referer": "http://r"}, "ok": true})),
        ];
        let mut out = Vec::new();
        render_json(&rows, &mut out).unwrap();

        let parsed: Vec<FlatRecord> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn test_json_empty() {
        let mut out = Vec::new();
        render_json(&[], &mut out).unwrap();
        assert_eq!(out, b"[]\n");
    }

    #[test]
    fn test_table_columns_are_union_in_first_seen_order() {
        let rows = vec![
            record(json!({"ts": 1, "url": "/a"})),
            record(json!({"status": 404, "ts": 2})),
        ];
        let text = table(&rows, 48);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "(index)  ts  url  status");
        assert_eq!(lines[1], "-------  --  ---  ------");
        assert_eq!(lines[2], "0        1   /a");
        assert_eq!(lines[3], "1        2        404");
    }

    #[test]
    fn test_table_cells_for_nested_values() {
        let rows = vec![record(json!({"key": ["logs", 1], "ok": false, "none": null}))];
        let text = table(&rows, 48);
        assert!(text.lines().nth(2).unwrap().contains(r#"["logs",1]  false  null"#));
    }

    #[test]
    fn test_table_truncates_long_cells() {
        let rows = vec![record(json!({"ua": "Mozilla/5.0 (X11; Linux x86_64)"}))];
        let text = table(&rows, 10);
        assert!(text.lines().nth(2).unwrap().ends_with("Mozilla/5…"));
    }

    #[test]
    fn test_table_flattens_newlines() {
        let rows = vec![record(json!({"msg": "a\nb"}))];
        assert_eq!(table(&rows, 0).lines().nth(2).unwrap(), "0        a b");
    }

    #[test]
    fn test_table_without_rows_prints_header() {
        assert_eq!(table(&[], 48), "(index)\n-------\n");
    }
}
