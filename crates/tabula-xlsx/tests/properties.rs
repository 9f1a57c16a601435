use proptest::prelude::*;

use tabula_xlsx::{
    column_index, column_letters, escape_xml, excel_serial_to_epoch_micros, CellPos, StringTable,
    MAX_SHEET_COLS, MAX_SHEET_ROWS,
};

proptest! {
    #[test]
    fn column_letters_roundtrip(col in 1u32..=MAX_SHEET_COLS) {
        let letters = column_letters(col);
        prop_assert!(letters.bytes().all(|b| b.is_ascii_uppercase()));
        prop_assert_eq!(column_index(&letters), Some(col));
    }

    #[test]
    fn cell_ref_roundtrip(row in 1u32..=MAX_SHEET_ROWS, col in 1u32..=MAX_SHEET_COLS) {
        let pos = CellPos::new(row, col);
        prop_assert_eq!(CellPos::parse(&pos.to_a1()), Some(pos));
    }

    #[test]
    fn escape_unescape_roundtrip(text in "\\PC*", nul_at_ends in any::<bool>()) {
        let input = if nul_at_ends {
            format!("\0{text}\0")
        } else {
            text.clone()
        };
        let escaped = escape_xml(&input);
        let unescaped = quick_xml::escape::unescape(&escaped).unwrap();
        let without_nuls: String = input.chars().filter(|&c| c != '\0').collect();
        prop_assert_eq!(unescaped.into_owned(), without_nuls);
    }

    #[test]
    fn string_table_dedup(words in proptest::collection::vec("[a-z]{0,8}", 0..64)) {
        let mut table = StringTable::new();
        let mut first_index = std::collections::HashMap::new();
        for word in &words {
            let idx = table.add(word);
            let expected = *first_index.entry(word.clone()).or_insert(idx);
            prop_assert_eq!(idx, expected);
            prop_assert_eq!(table.get(idx).map(|s| s.to_string()), Some(word.clone()));
        }
        prop_assert_eq!(table.len(), first_index.len());
    }

    #[test]
    fn serial_conversion_is_monotone(a in 0.0f64..1.0e6, b in 0.0f64..1.0e6) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(excel_serial_to_epoch_micros(lo) <= excel_serial_to_epoch_micros(hi));
    }
}

#[test]
fn serial_anchor_values() {
    assert_eq!(excel_serial_to_epoch_micros(25_569.0), 0);
    assert_eq!(excel_serial_to_epoch_micros(25_570.0), 86_400_000_000);
    assert_eq!(excel_serial_to_epoch_micros(25_569.5), 43_200_000_000);
}
