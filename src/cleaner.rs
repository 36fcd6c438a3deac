/// Pull a whole count out of a noisy cell such as `"$1,234.5abc"`.
///
/// Everything but ASCII digits and dots is dropped, the rest is read as a
/// float and truncated. Empty or unreadable leftovers yield 0 so one bad
/// cell never aborts an import.
pub fn clean_count(cell: &str) -> i64 {
    let digits: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_symbols_and_truncates() {
        assert_eq!(clean_count("$1,234.5abc"), 1234);
        assert_eq!(clean_count(" 7 "), 7);
        assert_eq!(clean_count("12 hrs"), 12);
    }

    #[test]
    fn unreadable_cells_are_zero() {
        assert_eq!(clean_count(""), 0);
        assert_eq!(clean_count("--"), 0);
        assert_eq!(clean_count("."), 0);
        assert_eq!(clean_count("1.2.3"), 0);
        assert_eq!(clean_count("n/a"), 0);
    }

    #[test]
    fn sign_is_discarded() {
        assert_eq!(clean_count("-4"), 4);
    }
}
