use url::Url;

/// Derives a display name from the last path segment of a detail URL
///
/// Hyphens become spaces and each word is title-cased, so
/// `/p/acme-concrete-co` yields `Acme Concrete Co`.
///
/// Returns `None` when the URL has no usable trailing segment.
pub fn name_from_detail_url(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    let name = title_case(&segment.replace('-', " "));
    let name = name.trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest
///
/// A word starts at any letter that follows a non-letter, so `o'neil-2nd`
/// becomes `O'Neil-2Nd`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}
