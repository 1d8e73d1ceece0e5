
/// Return a version of `text` that is exactly `width` chars long.  Truncates if it is too long,
/// and appends space characters if it is not long enough.
pub fn force_width(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let have = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - have));
    out
}

#[test]
fn force_width_pads_and_truncates() {
    assert_eq!(force_width("abc", 5), "abc  ");
    assert_eq!(force_width("abcdef", 3), "abc");
    assert_eq!(force_width("", 2), "  ");
}

#[test]
fn force_width_counts_chars_not_bytes() {
    assert_eq!(force_width("héllo", 3), "hél");
    assert_eq!(force_width("é", 2), "é ");
}
