// turning rows into a chat reply

use serde_json::Value;

use crate::core::QueryResult;

pub const FOLLOW_UP: &str = "Would you like to broaden the search criteria?";

pub fn compose(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return "No matching properties found.".to_string();
    }

    let noun = if result.row_count == 1 {
        "property"
    } else {
        "properties"
    };

    let listing = result.column("location").is_some() || result.column("type").is_some();

    let mut out = format!("Found {} matching {noun}:", result.row_count);
    for (i, row) in result.rows.iter().enumerate() {
        let line = if listing {
            listing_line(result, row)
        } else {
            generic_line(&result.columns, row)
        };
        out.push_str(&format!("\n{}. {line}", i + 1));
    }
    out
}

/// Offer to widen the search when the reply says nothing matched.
pub fn with_follow_up(text: String) -> String {
    let lower = text.to_lowercase();
    let empty = lower.contains("no ")
        && ["result", "found", "match"].iter().any(|w| lower.contains(w));

    if empty {
        format!("{text}\n\n{FOLLOW_UP}")
    } else {
        text
    }
}

/// 2450000 -> "2,450,000"
pub fn format_aed(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    if amount < 0 {
        format!("-{out}")
    } else {
        out
    }
}

fn listing_line(result: &QueryResult, row: &[Value]) -> String {
    let get = |name: &str| result.column(name).and_then(|i| row.get(i)).filter(|v| !v.is_null());

    let head = match (get("type"), get("location")) {
        (Some(t), Some(l)) => format!("{} in {}", text(t), text(l)),
        (Some(t), None) => text(t),
        (None, Some(l)) => text(l),
        (None, None) => String::new(),
    };

    let mut parts = Vec::new();
    if !head.is_empty() {
        parts.push(head);
    }
    if let Some(b) = get("bedrooms") {
        let n = text(b);
        parts.push(if n == "1" {
            "1 bedroom".to_string()
        } else {
            format!("{n} bedrooms")
        });
    }
    if let Some(p) = get("price") {
        parts.push(format!("{} AED", price(p)));
    }
    if let Some(p) = get("possession") {
        parts.push(text(p));
    }
    if get("available").is_some_and(is_false) {
        parts.push("not available".to_string());
    }

    // columns the listing format doesn't know about
    for (i, col) in result.columns.iter().enumerate() {
        let known = ["id", "type", "location", "bedrooms", "price", "possession", "available"];
        if known.iter().any(|k| col.eq_ignore_ascii_case(k)) {
            continue;
        }
        if let Some(v) = row.get(i).filter(|v| !v.is_null()) {
            parts.push(format!("{col}: {}", text(v)));
        }
    }

    parts.join(" · ")
}

fn generic_line(columns: &[String], row: &[Value]) -> String {
    columns
        .iter()
        .zip(row)
        .map(|(c, v)| {
            if c.to_lowercase().contains("price") {
                format!("{c}: {} AED", price(v))
            } else {
                format!("{c}: {}", text(v))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn price(v: &Value) -> String {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => format_aed(i),
            None => n
                .as_f64()
                .map(|f| format_aed(f.round() as i64))
                .unwrap_or_else(|| n.to_string()),
        },
        other => text(other),
    }
}

// sqlite hands booleans back as 0/1
fn is_false(v: &Value) -> bool {
    matches!(v, Value::Bool(false)) || v.as_i64() == Some(0)
}

fn text(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            row_count: rows.len(),
            rows,
        }
    }

    #[test]
    fn aed_separators() {
        assert_eq!(format_aed(0), "0");
        assert_eq!(format_aed(950), "950");
        assert_eq!(format_aed(2_450_000), "2,450,000");
        assert_eq!(format_aed(48_000_000), "48,000,000");
        assert_eq!(format_aed(-1_500), "-1,500");
    }

    #[test]
    fn listing_rows() {
        let r = result(
            &["id", "location", "price", "type", "bedrooms", "available", "possession"],
            vec![
                vec![json!(1), json!("Dubai Marina"), json!(2450000), json!("Apartment"), json!(2), json!(1), json!("Ready")],
                vec![json!(2), json!("Business Bay"), json!(1850000), json!("Apartment"), json!(1), json!(false), json!("Q4 2025")],
            ],
        );
        assert_eq!(
            compose(&r),
            "Found 2 matching properties:\n\
             1. Apartment in Dubai Marina · 2 bedrooms · 2,450,000 AED · Ready\n\
             2. Apartment in Business Bay · 1 bedroom · 1,850,000 AED · Q4 2025 · not available"
        );
    }

    #[test]
    fn aggregate_rows_are_generic() {
        let r = result(&["avg_price"], vec![vec![json!(3250000.4)]]);
        assert_eq!(compose(&r), "Found 1 matching property:\n1. avg_price: 3,250,000 AED");
    }

    #[test]
    fn extra_columns_are_appended() {
        let r = result(&["location", "listings"], vec![vec![json!("Meydan"), json!(12)]]);
        assert_eq!(compose(&r), "Found 1 matching property:\n1. Meydan · listings: 12");
    }

    #[test]
    fn empty_result_gets_follow_up() {
        let text = with_follow_up(compose(&QueryResult::default()));
        assert_eq!(
            text,
            "No matching properties found.\n\nWould you like to broaden the search criteria?"
        );
    }

    #[test]
    fn follow_up_only_for_empty_answers() {
        let found = "Found 3 matching properties:".to_string();
        assert_eq!(with_follow_up(found.clone()), found);

        let llm = "There are no results for villas under 1M.".to_string();
        assert!(with_follow_up(llm).ends_with(FOLLOW_UP));

        let no_keyword = "No idea.".to_string();
        assert_eq!(with_follow_up(no_keyword.clone()), no_keyword);
    }
}
