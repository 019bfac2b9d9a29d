// read-only sql policy
// only a single SELECT (or WITH ... SELECT) gets through

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::{Dialect as SqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::core::db::Dialect;

pub struct Safety {
    pub is_dangerous: bool,
    pub reason: String,
    pub warning: Option<String>,
}

// anything that writes, changes structure, or touches the engine
const BLOCKED_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "TRUNCATE", "CREATE", "GRANT", "REVOKE",
    "MERGE", "ATTACH", "DETACH", "PRAGMA", "COPY", "VACUUM", "INTO",
];

impl Safety {
    pub fn check(sql: &str, dialect: Dialect) -> Self {
        let sql = sql.trim();

        if sql.is_empty() {
            return Self::blocked("no SQL was generated");
        }

        // the model answers BLOCKED when asked to change data
        if sql.trim_end_matches(['.', ';']).eq_ignore_ascii_case("BLOCKED") {
            return Self::blocked("the request asks to modify data");
        }

        let scan = scan(sql);

        if scan.has_comment {
            return Self::blocked("SQL comment, possible injection");
        }

        if let Some(word) = scan
            .words
            .iter()
            .find(|w| BLOCKED_KEYWORDS.contains(&w.as_str()))
        {
            return Self::blocked(&format!("{word} is not allowed, searches are read-only"));
        }

        let statements = match parse(sql, dialect) {
            Ok(s) => s,
            Err(e) => return Self::blocked(&format!("could not parse SQL: {e}")),
        };

        match statements.as_slice() {
            [] => return Self::blocked("no SQL statement found"),
            [Statement::Query(q)] if writes(q) => {
                return Self::blocked("SELECT INTO creates a table, searches are read-only");
            }
            [Statement::Query(_)] => {}
            [_] => return Self::blocked("only SELECT queries are allowed"),
            _ => return Self::blocked("multiple statements are not allowed"),
        }

        // not dangerous but worth mentioning
        let warning = if scan.words.iter().any(|w| w == "LIMIT") {
            None
        } else {
            Some("no LIMIT clause, results will be capped".to_string())
        };

        Self {
            is_dangerous: false,
            reason: String::new(),
            warning,
        }
    }

    fn blocked(reason: &str) -> Self {
        Self {
            is_dangerous: true,
            reason: reason.to_string(),
            warning: None,
        }
    }
}

fn parse(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, sqlparser::parser::ParserError> {
    let d: Box<dyn SqlDialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Mysql => Box::new(MySqlDialect {}),
    };
    Parser::parse_sql(d.as_ref(), sql)
}

// postgres runs SELECT ... INTO as CREATE TABLE AS, so a Query can still write
fn writes(query: &Query) -> bool {
    let mut ctes = query.with.iter().flat_map(|w| &w.cte_tables);
    ctes.any(|cte| writes(&cte.query)) || body_writes(&query.body)
}

fn body_writes(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_some(),
        SetExpr::Query(q) => writes(q),
        SetExpr::SetOperation { left, right, .. } => body_writes(left) || body_writes(right),
        SetExpr::Insert(_) | SetExpr::Update(_) => true,
        SetExpr::Values(_) | SetExpr::Table(_) => false,
    }
}

struct Scan {
    // upper-cased bare words outside quotes
    words: Vec<String>,
    has_comment: bool,
}

// walk the sql once, skipping quoted strings and identifiers
fn scan(sql: &str) -> Scan {
    let mut words = Vec::new();
    let mut has_comment = false;
    let mut word = String::new();
    let mut chars = sql.chars().peekable();

    let flush = |word: &mut String, words: &mut Vec<String>| {
        if !word.is_empty() {
            words.push(word.to_uppercase());
            word.clear();
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                flush(&mut word, &mut words);
                // doubled quote is an escaped quote and keeps us inside
                while let Some(q) = chars.next() {
                    if q == c {
                        if chars.peek() == Some(&c) {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                has_comment = true;
                flush(&mut word, &mut words);
            }
            '/' if chars.peek() == Some(&'*') => {
                has_comment = true;
                flush(&mut word, &mut words);
            }
            '#' => {
                // mysql line comment
                has_comment = true;
                flush(&mut word, &mut words);
            }
            c if c.is_alphanumeric() || c == '_' => word.push(c),
            _ => flush(&mut word, &mut words),
        }
    }
    flush(&mut word, &mut words);

    Scan { words, has_comment }
}
