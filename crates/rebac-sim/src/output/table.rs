//! Plain-text table formatting shared by every renderer.

/// Formats rows as left-aligned columns, each padded to its widest cell plus two spaces.
pub fn format_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            line.push_str(&format!("{:<width$}", cell, width = widths[i] + 2));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Two decimals, or `n/a` when the metric is undefined.
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

/// At most two decimals with trailing zeros dropped ("2", "1.5", "0.33").
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
