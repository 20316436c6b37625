//! String normalization shared by the name and SKU scoring rules.

const BRAND_SEPARATORS: &[char] = &['-', '–', '—', ':', '|', '/'];

/// Lower-cases, drops punctuation and collapses whitespace.
pub fn normalize_name(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized name with a leading brand marker ("LOFT" or "LOFT.73") and a
/// trailing dash removed.
pub fn core_name<S: AsRef<str>>(raw: &str, brands: &[S]) -> String {
    let trimmed = raw.trim();
    let without_brand = brands
        .iter()
        .find_map(|brand| strip_brand(trimmed, brand.as_ref()))
        .unwrap_or(trimmed);

    let mut core = without_brand.trim_end();
    while let Some(rest) = core.strip_suffix('-') {
        core = rest.trim_end();
    }

    normalize_name(core)
}

fn strip_brand<'a>(s: &'a str, brand: &str) -> Option<&'a str> {
    let brand = brand.trim();
    let head = s.get(..brand.len())?;
    if brand.is_empty() || !head.eq_ignore_ascii_case(brand) {
        return None;
    }

    let mut rest = &s[brand.len()..];

    // Optional ".NN" collection number
    if let Some(after_dot) = rest.strip_prefix('.') {
        let digits = after_dot.len() - after_dot.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 {
            rest = &after_dot[digits..];
        }
    }

    // "LOFTY" is not the LOFT brand
    if rest.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        return None;
    }

    Some(rest.trim_start_matches(|c: char| c.is_whitespace() || BRAND_SEPARATORS.contains(&c)))
}

/// Upper-cased, trimmed SKU.
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// SKU reduced to its alphanumeric characters.
pub fn strip_sku(sku: &str) -> String {
    sku.chars().filter(|c| c.is_alphanumeric()).collect()
}
