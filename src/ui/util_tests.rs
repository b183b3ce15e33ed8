#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::util::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
}

#[test]
fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 5), "hell…");
}

#[test]
fn test_truncate_edges() {
    assert_eq!(truncate("", 5), "");
    assert_eq!(truncate("hello", 0), "");
    assert_eq!(truncate("hello", 1), "…");
}

#[test]
fn test_truncate_unicode() {
    assert_eq!(truncate("café résumé", 5), "café…");
    assert_eq!(truncate("日本語テスト", 4), "日本語…");
}

// ── format_amount ─────────────────────────────────────────────

#[test]
fn test_format_amount_basic() {
    assert_eq!(format_amount(dec!(1234.56)), "₹1,234.56");
    assert_eq!(format_amount(dec!(999.99)), "₹999.99");
}

#[test]
fn test_format_amount_zero_and_padding() {
    assert_eq!(format_amount(dec!(0)), "₹0.00");
    assert_eq!(format_amount(dec!(1.5)), "₹1.50");
}

#[test]
fn test_format_amount_negative() {
    assert_eq!(format_amount(dec!(-42.50)), "-₹42.50");
    assert_eq!(format_amount(dec!(-99999.01)), "-₹99,999.01");
}

#[test]
fn test_format_amount_large() {
    assert_eq!(format_amount(dec!(10000000.00)), "₹10,000,000.00");
}

// ── parse_amount ──────────────────────────────────────────────

#[test]
fn test_parse_amount_accepts_symbols() {
    assert_eq!(parse_amount("1,200.50").unwrap(), dec!(1200.50));
    assert_eq!(parse_amount("₹99").unwrap(), dec!(99));
    assert_eq!(parse_amount("  12 ").unwrap(), dec!(12));
}

#[test]
fn test_parse_amount_must_be_positive() {
    assert!(parse_amount("0").is_err());
    assert!(parse_amount("-5").is_err());
    assert!(parse_amount("abc").is_err());
    assert!(parse_amount("").is_err());
}

#[test]
fn test_parse_amount_rounds_to_paise() {
    assert_eq!(parse_amount("10.125").unwrap(), dec!(10.12));
    assert_eq!(parse_amount("10.126").unwrap(), dec!(10.13));
    assert!(parse_amount("0.004").is_err());
}

// ── month_label ───────────────────────────────────────────────

#[test]
fn test_month_label() {
    assert_eq!(month_label(2024, 3), "March 2024");
    assert_eq!(month_label(2024, 13), "2024-13");
}

// ── scrolling ─────────────────────────────────────────────────

#[test]
fn test_scroll_down_moves_window() {
    let (mut index, mut scroll) = (0, 0);
    for _ in 0..5 {
        scroll_down(&mut index, &mut scroll, 10, 3);
    }
    assert_eq!(index, 5);
    assert_eq!(scroll, 3);
}

#[test]
fn test_scroll_stops_at_ends() {
    let (mut index, mut scroll) = (0, 0);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));

    scroll_to_bottom(&mut index, &mut scroll, 4, 10);
    assert_eq!((index, scroll), (3, 0));
    scroll_down(&mut index, &mut scroll, 4, 10);
    assert_eq!(index, 3);

    scroll_to_top(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));
}

#[test]
fn test_clamp_cursor_after_delete() {
    let (mut index, mut scroll) = (4, 3);
    clamp_cursor(&mut index, &mut scroll, 2);
    assert_eq!((index, scroll), (1, 1));
    clamp_cursor(&mut index, &mut scroll, 0);
    assert_eq!((index, scroll), (0, 0));
}
