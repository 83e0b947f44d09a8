/// Normalize a license plate for storage: trim, uppercase, collapse
/// interior whitespace to single spaces. Plates compare and dedupe on the
/// normalized form.
pub fn normalize_plate(raw: &str) -> String {
    raw.to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercases() {
        assert_eq!(normalize_plate("kda 123x"), "KDA 123X");
    }

    #[test]
    fn test_trims_and_collapses_whitespace() {
        assert_eq!(normalize_plate("  kda   123x "), "KDA 123X");
    }

    #[test]
    fn test_already_normalized_unchanged() {
        assert_eq!(normalize_plate("KDA 123X"), "KDA 123X");
    }

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(normalize_plate("   "), "");
    }
}
