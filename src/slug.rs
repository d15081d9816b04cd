//! Filename → URL slug conversion.
//!
//! Slugs are derived from the source filename alone so the importer can decide
//! whether a post already exists before it opens the document.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Maximum slug length accepted by the `blog_posts.slug` column.
pub const MAX_SLUG_LENGTH: usize = 255;

/// Letters left over after transliteration that have no ASCII form.
static UNMAPPED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\x00-\x7F\s]").unwrap());

/// Whitespace and punctuation between words.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Letters that sound like two Latin letters. Applied before the single-letter table.
const DIGRAPHS: &[(char, &str)] = &[
    ('ё', "yo"),
    ('ж', "zh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ю', "yu"),
    ('я', "ya"),
    ('ї', "yi"),
    ('є', "ye"),
    ('Ё', "Yo"),
    ('Ж', "Zh"),
    ('Ц', "Ts"),
    ('Ч', "Ch"),
    ('Ш', "Sh"),
    ('Щ', "Sch"),
    ('Ю', "Yu"),
    ('Я', "Ya"),
    ('Ї', "Yi"),
    ('Є', "Ye"),
];

const LETTERS: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('і', "i"),
    ('ґ', "g"),
    ('ў', "u"),
    ('А', "A"),
    ('Б', "B"),
    ('В', "V"),
    ('Г', "G"),
    ('Д', "D"),
    ('Е', "E"),
    ('З', "Z"),
    ('И', "I"),
    ('Й', "Y"),
    ('К', "K"),
    ('Л', "L"),
    ('М', "M"),
    ('Н', "N"),
    ('О', "O"),
    ('П', "P"),
    ('Р', "R"),
    ('С', "S"),
    ('Т', "T"),
    ('У', "U"),
    ('Ф', "F"),
    ('Х', "H"),
    ('Ъ', ""),
    ('Ы', "Y"),
    ('Ь', ""),
    ('Э', "E"),
    ('І', "I"),
    ('Ґ', "G"),
    ('Ў', "U"),
];

/// Transliterate Cyrillic letters to Latin. Characters outside the tables pass through.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let mapped = DIGRAPHS
            .iter()
            .chain(LETTERS.iter())
            .find(|(from, _)| *from == c)
            .map(|(_, to)| *to);
        match mapped {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

/// Build a slug from a filename. The result may be empty; see [`slug_or_fallback`].
pub fn slug(filename: &str) -> String {
    let stem = file_stem(filename);
    let latin = transliterate(stem).to_lowercase();
    let kept = UNMAPPED.replace_all(&latin, "");
    let hyphenated = SEPARATORS.replace_all(&kept, "-");
    hyphenated.trim_matches('-').to_string()
}

/// Slug for a filename that is never empty.
///
/// Filenames made only of characters with no Latin counterpart fall back to
/// `post-<md5 prefix of the stem>`, which keeps the slug a pure function of the name.
pub fn slug_or_fallback(filename: &str) -> String {
    let slug = slug(filename);
    if !slug.is_empty() {
        return slug;
    }
    let digest = format!("{:x}", md5::compute(file_stem(filename).as_bytes()));
    format!("post-{}", &digest[..8])
}

/// Shorten a slug to `max` characters without leaving a dangling hyphen.
pub fn truncate_slug(slug: &str, max: usize) -> String {
    if slug.len() <= max {
        return slug.to_string();
    }
    // Slugs are ASCII, so byte slicing is safe.
    slug[..max].trim_end_matches('-').to_string()
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}
