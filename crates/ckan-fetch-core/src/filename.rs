//! Local file names for downloaded resources.

use url::Url;

use crate::models::ResourceDescriptor;

/// Name used when neither the resource name nor its URL yields anything usable.
const FALLBACK_FILENAME: &str = "resource";

/// Upper bound on a file name in bytes. Leaves room under the usual 255-byte
/// limit for the `.<name>.part` temporary sibling.
const MAX_FILENAME_BYTES: usize = 200;

/// Derives the local file name for a resource.
///
/// The resource `name` is sanitized; when it carries no extension, one is
/// taken from the URL path, or failing that from the declared `format`.
/// A name that sanitizes to nothing falls back to the last URL segment.
/// Names longer than 200 bytes are shortened, keeping the extension.
///
/// ```
/// use ckan_fetch_core::{filename::resource_filename, ResourceDescriptor};
///
/// let r = ResourceDescriptor::new("Billed consumption 2021", "https://example.org/dl/billed.csv");
/// assert_eq!(resource_filename(&r), "Billed_consumption_2021.csv");
/// ```
pub fn resource_filename(resource: &ResourceDescriptor) -> String {
    cap_length(full_filename(resource))
}

fn full_filename(resource: &ResourceDescriptor) -> String {
    let parsed = Url::parse(&resource.url).ok();
    let base = sanitize_filename(&resource.name);

    if base.is_empty() {
        return parsed
            .as_ref()
            .and_then(last_path_segment)
            .map(|s| sanitize_filename(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    }

    if has_extension(&base) {
        return base;
    }

    let extension = parsed
        .as_ref()
        .and_then(extension_from_url)
        .or_else(|| resource.format.as_deref().and_then(extension_from_format));

    match extension {
        Some(ext) => format!("{}{}", base, ext),
        None => base,
    }
}

/// Replaces characters that are illegal or awkward in file names with `_`.
///
/// Runs of replaced characters collapse into one `_`; leading and trailing
/// `_` and `.` are stripped so the result can never be `.`, `..` or hidden.
pub fn sanitize_filename(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// Truncates the stem on a char boundary so the whole name fits in
/// `MAX_FILENAME_BYTES`.
fn cap_length(name: String) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(i) if is_plausible_extension(&name[i + 1..]) => name.split_at(i),
        _ => (name.as_str(), ""),
    };
    let mut end = MAX_FILENAME_BYTES - ext.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let stem = stem[..end].trim_end_matches(|c| c == '_' || c == '.');
    format!("{}{}", stem, ext)
}

fn has_extension(name: &str) -> bool {
    name.rfind('.')
        .map(|i| is_plausible_extension(&name[i + 1..]))
        .unwrap_or(false)
}

fn is_plausible_extension(ext: &str) -> bool {
    (1..=8).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

fn extension_from_url(url: &Url) -> Option<String> {
    let segment = last_path_segment(url)?;
    let dot = segment.rfind('.')?;
    let ext = &segment[dot + 1..];
    is_plausible_extension(ext).then(|| format!(".{}", ext.to_lowercase()))
}

fn extension_from_format(format: &str) -> Option<String> {
    let ext = format.trim().trim_start_matches('.').to_lowercase();
    is_plausible_extension(&ext).then(|| format!(".{}", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f"), "a_b_c_d_e_f");
        assert_eq!(sanitize_filename("  spaced   out  "), "spaced_out");
        assert_eq!(sanitize_filename("tab\tand\nnewline"), "tab_and_newline");
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn test_name_with_extension_kept() {
        let r = ResourceDescriptor::new("data.csv", "https://example.org/other.xlsx");
        assert_eq!(resource_filename(&r), "data.csv");
    }

    #[test]
    fn test_extension_from_url() {
        let r = ResourceDescriptor::new("Water usage", "https://example.org/download/Water.XLSX?x=1");
        assert_eq!(resource_filename(&r), "Water_usage.xlsx");
    }

    #[test]
    fn test_extension_from_format() {
        let r = ResourceDescriptor::new("Water usage", "https://example.org/download/1234")
            .with_format("CSV");
        assert_eq!(resource_filename(&r), "Water_usage.csv");
    }

    #[test]
    fn test_no_extension_available() {
        let r = ResourceDescriptor::new("a", "https://example.org/a");
        assert_eq!(resource_filename(&r), "a");
    }

    #[test]
    fn test_empty_name_falls_back_to_url() {
        let r = ResourceDescriptor::new("???", "https://example.org/files/report.pdf");
        assert_eq!(resource_filename(&r), "report.pdf");
    }

    #[test]
    fn test_empty_name_and_url_fallback() {
        let r = ResourceDescriptor::new("", "not a url");
        assert_eq!(resource_filename(&r), FALLBACK_FILENAME);
    }

    #[test]
    fn test_version_number_is_not_an_extension() {
        // "v1.2 final" sanitizes to "v1.2_final", whose suffix is not alphanumeric-only
        let r = ResourceDescriptor::new("v1.2 final", "https://example.org/f.json");
        assert_eq!(resource_filename(&r), "v1.2_final.json");
    }

    #[test]
    fn test_long_name_is_capped_and_keeps_extension() {
        let name = "Résumé des données ".repeat(20);
        let r = ResourceDescriptor::new(name, "https://example.org/files/x").with_format("CSV");

        let file = resource_filename(&r);

        assert!(file.len() <= MAX_FILENAME_BYTES);
        assert!(file.starts_with("Résumé_des_données_"));
        assert!(file.ends_with(".csv"));
        assert!(!file.ends_with("_.csv"));
        // the temporary sibling must fit too
        assert!(format!(".{}.part", file).len() < 255);
    }

    #[test]
    fn test_long_url_fallback_is_capped() {
        let segment = "x".repeat(300);
        let r = ResourceDescriptor::new("", format!("https://example.org/{}.json", segment));

        let file = resource_filename(&r);

        assert_eq!(file.len(), MAX_FILENAME_BYTES);
        assert!(file.ends_with(".json"));
    }

    #[test]
    fn test_short_name_untouched_by_cap() {
        let name = "a".repeat(MAX_FILENAME_BYTES);
        assert_eq!(cap_length(name.clone()), name);
    }
}
