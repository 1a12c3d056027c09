//! macOS virtual key-code to display-label mapping.

/// Sorted by key code so lookups can binary search.
const KEY_NAMES: &[(i64, &str)] = &[
    (0, "A"),
    (1, "S"),
    (2, "D"),
    (3, "F"),
    (4, "H"),
    (5, "G"),
    (6, "Z"),
    (7, "X"),
    (8, "C"),
    (9, "V"),
    (11, "B"),
    (12, "Q"),
    (13, "W"),
    (14, "E"),
    (15, "R"),
    (16, "Y"),
    (17, "T"),
    (18, "1"),
    (19, "2"),
    (20, "3"),
    (21, "4"),
    (22, "6"),
    (23, "5"),
    (24, "="),
    (25, "9"),
    (26, "7"),
    (27, "-"),
    (28, "8"),
    (29, "0"),
    (30, "]"),
    (31, "O"),
    (32, "U"),
    (33, "["),
    (34, "I"),
    (35, "P"),
    (36, "↩"),
    (37, "L"),
    (38, "J"),
    (39, "'"),
    (40, "K"),
    (41, ";"),
    (42, "\\"),
    (43, ","),
    (44, "/"),
    (45, "N"),
    (46, "M"),
    (47, "."),
    (48, "⇥"),
    (49, "␣"),
    (50, "`"),
    (51, "⌫"),
    (53, "⎋"),
    (54, "⌘R"),
    (55, "⌘"),
    (56, "⇧"),
    (57, "⇪"),
    (58, "⌥"),
    (59, "⌃"),
    (60, "⇧R"),
    (61, "⌥R"),
    (62, "⌃R"),
    (63, "fn"),
    (64, "F17"),
    (65, "Keypad ."),
    (67, "Keypad *"),
    (69, "Keypad +"),
    (71, "Keypad Clear"),
    (72, "Volume Up"),
    (73, "Volume Down"),
    (74, "Mute"),
    (75, "Keypad /"),
    (76, "Keypad Enter"),
    (78, "Keypad -"),
    (79, "F18"),
    (80, "F19"),
    (81, "Keypad ="),
    (82, "Keypad 0"),
    (83, "Keypad 1"),
    (84, "Keypad 2"),
    (85, "Keypad 3"),
    (86, "Keypad 4"),
    (87, "Keypad 5"),
    (88, "Keypad 6"),
    (89, "Keypad 7"),
    (90, "F20"),
    (91, "Keypad 8"),
    (92, "Keypad 9"),
    (96, "F5"),
    (97, "F6"),
    (98, "F7"),
    (99, "F3"),
    (100, "F8"),
    (101, "F9"),
    (103, "F11"),
    (105, "F13"),
    (106, "F16"),
    (107, "F14"),
    (109, "F10"),
    (111, "F12"),
    (113, "F15"),
    (114, "Help"),
    (115, "↖"),
    (116, "⇞"),
    (117, "⌦"),
    (118, "F4"),
    (119, "↘"),
    (120, "F2"),
    (121, "⇟"),
    (122, "F1"),
    (123, "←"),
    (124, "→"),
    (125, "↓"),
    (126, "↑"),
];

/// Display label for a key code. Unknown codes get a `Key {code}` label so
/// every press stays representable.
pub fn key_name(key_code: i64) -> String {
    match KEY_NAMES.binary_search_by_key(&key_code, |entry| entry.0) {
        Ok(index) => KEY_NAMES[index].1.to_string(),
        Err(_) => format!("Key {key_code}"),
    }
}

/// Reverse lookup used by display surfaces; labels are unique in the table.
pub fn key_code(name: &str) -> Option<i64> {
    KEY_NAMES
        .iter()
        .find(|(_, label)| *label == name)
        .map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_letters_and_digits() {
        assert_eq!(key_name(0), "A");
        assert_eq!(key_name(18), "1");
        assert_eq!(key_name(29), "0");
    }

    #[test]
    fn resolves_modifier_and_special_symbols() {
        assert_eq!(key_name(55), "⌘");
        assert_eq!(key_name(49), "␣");
        assert_eq!(key_name(36), "↩");
        assert_eq!(key_name(126), "↑");
    }

    #[test]
    fn falls_back_to_numeric_label_for_unknown_codes() {
        assert_eq!(key_name(10), "Key 10");
        assert_eq!(key_name(999), "Key 999");
    }

    #[test]
    fn reverse_lookup_round_trips() {
        assert_eq!(key_code("A"), Some(0));
        assert_eq!(key_code("⌘"), Some(55));
        assert_eq!(key_code("no such key"), None);
    }

    #[test]
    fn table_is_sorted_for_binary_search() {
        for pair in KEY_NAMES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "table out of order at {:?}", pair);
        }
    }
}
