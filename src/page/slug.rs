//! URL slugs for set titles.

use unicode_normalization::UnicodeNormalization;

/// Convert a set title to the path segment it is served under.
///
/// Accents are stripped, letters lowercased and every run of anything that
/// isn't an ASCII letter or digit becomes a single `-`.
///
/// ```
/// use flickr_gallery::page::slug::slugify;
///
/// assert_eq!(slugify("Summer Trip"), "summer-trip");
/// assert_eq!(slugify("  Île-de-France, 2019!  "), "ile-de-france-2019");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
    {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}
