use chrono::{DateTime, Utc};

use crate::header::HeaderRecord;

/// Renders a Unix timestamp as `Month DD YYYY HH:MM:SS` followed by `Z`.
fn format_time(ts: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(t) => format!("{}Z", t.format("%B %d %Y %H:%M:%S")),
        None => ts.to_string(),
    }
}

/// Renders a difficulty value with thousands separators and one decimal
/// place, e.g. `3,007,383,866.8`.
fn format_difficulty(value: f64) -> String {
    let fixed = format!("{value:.1}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "0"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac_part}")
}

/// Multi-line human-readable rendering of one block header.
pub fn format_header(h: &HeaderRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Block Hash: {}\n", h.hash));
    out.push_str(&format!("Height: {}\n", h.height));
    out.push_str(&format!("Time: {}\n", format_time(h.time)));
    out.push_str(&format!("Median Time: {}\n", format_time(h.mediantime)));
    out.push_str(&format!("Bits: {:08x}\n", h.bits));
    out.push_str(&format!("Difficulty: {}\n", format_difficulty(h.difficulty)));
    out.push_str(&format!("Number of Transactions: {}\n", h.n_tx));
    out.push_str(&format!("Next Block Hash: {}\n", h.nextblockhash));
    out
}
