//! URL slug generation for Bulgarian titles.

/// Latin replacement for a lowercase Bulgarian Cyrillic letter.
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sht",
        'ъ' => "a",
        'ь' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Derive a URL-safe slug from arbitrary text.
///
/// Total and deterministic: the output matches `^[a-z0-9]+(-[a-z0-9]+)*$` or is
/// empty. Uniqueness is the caller's concern.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;

    for c in lowered.trim().chars() {
        let piece = match transliterate(c) {
            Some(latin) => latin,
            None if c.is_ascii_lowercase() || c.is_ascii_digit() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
                continue;
            }
            None if c == '-' || c.is_whitespace() => {
                pending_dash = true;
                continue;
            }
            // Anything else is dropped without acting as a separator.
            None => continue,
        };

        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push_str(piece);
    }

    slug
}

/// Whether `s` already has slug shape (`^[a-z0-9]+(-[a-z0-9]+)*$`).
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}
