pub const MIN_DIMENSION: u32 = 10;
pub const MAX_DIMENSION: u32 = 1000;
pub const DEFAULT_DIMENSION: u32 = 200;

/// Parses a `size` parameter of the form `<width>x<height>`.
///
/// Only square sizes are accepted; a non-square value is rejected, never
/// coerced. Both sides must lie within 10..=1000. Returns the side length.
pub fn parse(text: &str) -> Option<u32> {
    let (w, h) = text.split_once('x')?;
    let width = side(w)?;
    let height = side(h)?;
    if width != height || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&width) {
        return None;
    }
    Some(width)
}

fn side(part: &str) -> Option<u32> {
    if part.is_empty() || part.len() > 4 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_square_sizes_in_range() {
        assert_eq!(parse("200x200"), Some(200));
        assert_eq!(parse("10x10"), Some(10));
        assert_eq!(parse("1000x1000"), Some(1000));
    }

    #[test]
    fn rejects_non_square() {
        assert_eq!(parse("100x200"), None);
        assert_eq!(parse("200x100"), None);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(parse("9x9"), None);
        assert_eq!(parse("1001x1001"), None);
        assert_eq!(parse("0x0"), None);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse("200"), None);
        assert_eq!(parse("x200"), None);
        assert_eq!(parse("200x"), None);
        assert_eq!(parse("axb"), None);
        assert_eq!(parse("200x200x200"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("-10x-10"), None);
    }
}
