//! Delimiter detection from the header line.

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
pub const CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Pick the candidate occurring most often in `line`.
///
/// Ties go to the earlier candidate, and a line containing none of them
/// falls back to a comma. Quotes are not interpreted.
pub fn detect_delimiter(line: &[u8]) -> u8 {
    let mut best = CANDIDATES[0];
    let mut best_count = 0;
    for candidate in CANDIDATES {
        let count = line.iter().filter(|&&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Human readable name for a delimiter byte, used in the status line.
pub fn delimiter_name(delimiter: u8) -> String {
    match delimiter {
        b',' => "comma".to_string(),
        b'\t' => "tab".to_string(),
        b';' => "semicolon".to_string(),
        b'|' => "pipe".to_string(),
        other => format!("{:?}", other as char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_beats_comma() {
        assert_eq!(detect_delimiter(b"a;b;c"), b';');
    }

    #[test]
    fn test_highest_count_wins() {
        assert_eq!(detect_delimiter(b"a\tb\tc,d"), b'\t');
        assert_eq!(detect_delimiter(b"x|y|z;w"), b'|');
    }

    #[test]
    fn test_ties_prefer_candidate_order() {
        assert_eq!(detect_delimiter(b"a,b;c"), b',');
        assert_eq!(detect_delimiter(b"a|b;c"), b';');
        assert_eq!(detect_delimiter(b"a\tb|c"), b'\t');
    }

    #[test]
    fn test_no_candidate_defaults_to_comma() {
        assert_eq!(detect_delimiter(b"single_column"), b',');
    }

    #[test]
    fn test_quotes_are_not_special() {
        // the commas inside quotes still count
        assert_eq!(detect_delimiter(b"\"a,b,c\";d;e"), b',');
    }

    #[test]
    fn test_delimiter_name() {
        assert_eq!(delimiter_name(b'\t'), "tab");
        assert_eq!(delimiter_name(b':'), "':'");
    }
}
