use unicode_xid::UnicodeXID;

/// The first character of `name` that may not appear at its position in an identifier.
///
/// The first character must be a Unicode XID start character or `_`, the rest XID continue
/// characters. `extra` lists additional characters accepted after the first one.
pub(crate) fn first_invalid_char(name: &str, extra: &[char]) -> Option<char> {
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_xid_start() || first == '_') {
        return Some(first);
    }
    chars.find(|ch| !(ch.is_xid_continue() || extra.contains(ch)))
}
