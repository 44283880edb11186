//! Destination key derivation for the clean and error zones.

pub(crate) const DEFAULT_LANDING_SEGMENT: &str = "landing/";
pub(crate) const DEFAULT_CLEAN_SEGMENT: &str = "clean/";
pub(crate) const DEFAULT_ERROR_PREFIX: &str = "error";

/// Maps a landing-zone object key onto its clean-zone and error-zone keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathMapping {
    pub landing_segment: String,
    pub clean_segment: String,
    pub error_prefix: String,
}

impl Default for PathMapping {
    fn default() -> Self {
        Self {
            landing_segment: DEFAULT_LANDING_SEGMENT.to_string(),
            clean_segment: DEFAULT_CLEAN_SEGMENT.to_string(),
            error_prefix: DEFAULT_ERROR_PREFIX.to_string(),
        }
    }
}

impl PathMapping {
    /// `landing/2024/file.csv` -> `clean/2024/file.parquet`.
    ///
    /// Every occurrence of the landing segment is replaced, then whatever
    /// follows the last `.` of the whole key is swapped for `parquet`.
    pub fn clean_key(&self, input_key: &str) -> String {
        let moved = input_key.replace(&self.landing_segment, &self.clean_segment);
        let stem = match moved.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => moved.as_str(),
        };
        format!("{stem}.parquet")
    }

    /// `landing/2024/file.csv` -> `error/file.csv`.
    pub fn error_key(&self, input_key: &str) -> String {
        format!("{}/{}.csv", self.error_prefix, file_stem(input_key))
    }
}

/// Base filename without its extension. Leading dots belong to the name, so
/// `.env` has no extension.
fn file_stem(key: &str) -> &str {
    let base = key.rsplit('/').next().unwrap_or(key);
    let name_start = base.len() - base.trim_start_matches('.').len();
    match base.rfind('.') {
        Some(dot) if dot > name_start => &base[..dot],
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_key_swaps_zone_and_extension() {
        let mapping = PathMapping::default();
        assert_eq!(mapping.clean_key("landing/2024/file.csv"), "clean/2024/file.parquet");
    }

    #[test]
    fn clean_key_without_extension_appends_parquet() {
        let mapping = PathMapping::default();
        assert_eq!(mapping.clean_key("landing/raw"), "clean/raw.parquet");
    }

    #[test]
    fn clean_key_outside_landing_zone_keeps_path() {
        let mapping = PathMapping::default();
        assert_eq!(mapping.clean_key("inbox/data.v2.csv"), "inbox/data.v2.parquet");
    }

    #[test]
    fn error_key_uses_base_name() {
        let mapping = PathMapping::default();
        assert_eq!(
            mapping.error_key("landing/2024/customers_1762625441.csv"),
            "error/customers_1762625441.csv"
        );
        assert_eq!(mapping.error_key("file.tar.gz"), "error/file.tar.csv");
        assert_eq!(mapping.error_key("landing/.hidden"), "error/.hidden.csv");
        assert_eq!(mapping.error_key("landing/noext"), "error/noext.csv");
    }

    #[test]
    fn custom_mapping() {
        let mapping = PathMapping {
            landing_segment: "raw/".into(),
            clean_segment: "curated/".into(),
            error_prefix: "quarantine/rows".into(),
        };
        assert_eq!(mapping.clean_key("raw/a/b.csv"), "curated/a/b.parquet");
        assert_eq!(mapping.error_key("raw/a/b.csv"), "quarantine/rows/b.csv");
    }
}
