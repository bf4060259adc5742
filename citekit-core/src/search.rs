//! Web search query construction from citekey parts

use crate::citekey::CitekeyFormat;
use crate::error::CitekitError;

/// Placeholder in the URL template replaced by the joined query
pub const URL_PLACEHOLDER: &str = "%s";

/// Join selected capture groups of `citekey` with `delimiter`.
///
/// Group indices are 1-based, in the order they should appear in the query.
/// A citekey that fails to match the format is `InvalidCitekey`; the builder
/// never emits a query built from a partial match.
pub fn search_query(
    format: &CitekeyFormat,
    citekey: &str,
    groups: &[usize],
    delimiter: &str,
) -> crate::Result<String> {
    let captured = format.capture_groups(citekey)?;
    let mut parts = Vec::with_capacity(groups.len());
    for &group in groups {
        let value = group
            .checked_sub(1)
            .and_then(|i| captured.get(i))
            .ok_or_else(|| {
                CitekitError::Pattern(format!(
                    "search group {} out of range, pattern has {} groups",
                    group,
                    captured.len()
                ))
            })?;
        parts.push(value.as_str());
    }
    Ok(parts.join(delimiter))
}

/// Substitute the joined query into the single `%s` placeholder of
/// `url_template`.
pub fn search_url(
    format: &CitekeyFormat,
    citekey: &str,
    url_template: &str,
    groups: &[usize],
    delimiter: &str,
) -> crate::Result<String> {
    if !url_template.contains(URL_PLACEHOLDER) {
        return Err(CitekitError::MissingConfiguration(
            "search.url %s placeholder",
        ));
    }
    let query = search_query(format, citekey, groups, delimiter)?;
    Ok(url_template.replacen(URL_PLACEHOLDER, &query, 1))
}
