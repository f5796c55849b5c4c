//! User-facing date templates for overlay text.
//!
//! Templates use letter runs instead of strftime codes:
//!
//! | Token  | Output (2025-03-07)  |
//! |--------|----------------------|
//! | `mmmm` | March                |
//! | `mmm`  | Mar                  |
//! | `mm`   | 03                   |
//! | `m`    | 3                    |
//! | `dddd` | Friday               |
//! | `ddd`  | Fri                  |
//! | `dd`   | 07                   |
//! | `d`    | 7                    |
//! | `yyyy` | 2025 (`yyy` too)     |
//! | `yy`   | 25 (`y` too)         |
//!
//! The longest token is matched first, so `mmmm` never reads as `mm` + `mm`.
//! Anything that is not a token is copied through.

use chrono::{Datelike, NaiveDate};

/// Default template for upcoming release dates
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd";

const TOKENS: &[(&str, &str)] = &[
    ("mmmm", "%B"),
    ("dddd", "%A"),
    ("yyyy", "%Y"),
    ("mmm", "%b"),
    ("ddd", "%a"),
    ("yyy", "%Y"),
    ("mm", "%m"),
    ("dd", "%d"),
    ("yy", "%y"),
    ("m", "%-m"),
    ("d", "%-d"),
    ("y", "%y"),
];

/// Render `date` using a token template, optionally upper-cased
pub fn format_date(date: NaiveDate, template: &str, capitalize: bool) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    'outer: while !rest.is_empty() {
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(&render(date, spec));
                rest = tail;
                continue 'outer;
            }
        }

        // Not a token: copy one char
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    if capitalize {
        out.to_uppercase()
    } else {
        out
    }
}

fn render(date: NaiveDate, spec: &str) -> String {
    match spec {
        "%-m" => date.month().to_string(),
        "%-d" => date.day().to_string(),
        _ => date.format(spec).to_string(),
    }
}
