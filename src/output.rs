// output formatting for `ask` - pretty tables or raw json

use crate::core::{QueryResult, Reply};

pub struct Output;

impl Output {
    // answer text, then anything worth flagging
    pub fn reply(reply: &Reply) {
        println!("{}\n", reply.response);

        if let Some(warning) = &reply.warning {
            println!("warning: {warning}");
        }
        if let Some(sql) = &reply.sql {
            println!("sql: {sql}");
        }
    }

    // nice table format for humans
    pub fn pretty(result: &QueryResult) {
        print!("{}", table(result));
    }

    // raw json for scripts
    pub fn raw(reply: &Reply) {
        println!("{}", serde_json::to_string(reply).unwrap_or_default());
    }
}

pub fn table(result: &QueryResult) -> String {
    let mut out = format!("rows: {}\n\n", result.row_count);

    if result.rows.is_empty() {
        out.push_str("no results\n");
        return out;
    }

    // figure out column widths, capped at 40
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &result.rows {
        for (i, val) in row.iter().enumerate() {
            let len = format_value(val).chars().count();
            if i < widths.len() && len > widths[i] {
                widths[i] = len;
            }
        }
    }
    for w in &mut widths {
        *w = (*w).min(40);
    }

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{c:w$}"))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');

    for row in &result.rows {
        let formatted: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:w$}", clip(&format_value(v), 40)))
            .collect();
        out.push_str(formatted.join(" | ").trim_end());
        out.push('\n');
    }

    out
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn format_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}
