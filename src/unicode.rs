//! Character-level Unicode classification for mixed Han/Latin text.

pub fn is_han(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
        || ('\u{F900}'..='\u{FAFF}').contains(&c)
        || c == '〇'
}

pub fn is_latin_alnum(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Map full-width ASCII forms (ＡＢＣ, ０１２, ！) to their ASCII
/// counterparts. The ideographic space becomes a plain space.
pub fn fold_fullwidth(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{3000}' => ' ',
        _ => c,
    }
}

/// Fold a character for case-insensitive comparison.
///
/// Always yields exactly one char so that folded text stays index-aligned
/// with the source. Lowercase expansions ('İ' -> "i̇") keep only their
/// first char.
pub fn fold_char(c: char) -> char {
    let c = fold_fullwidth(c);
    c.to_lowercase().next().unwrap_or(c)
}
