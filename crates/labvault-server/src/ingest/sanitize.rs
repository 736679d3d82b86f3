//! Storage-key sanitization
//!
//! Pure functions that turn uploader-supplied names into safe key segments.
//! Base and extension are split the way path-style tooling does it: the last
//! `.` of the final `/`-separated segment starts the extension, except that
//! leading dots of a segment never do (`.bashrc` has no extension).

use chrono::{DateTime, Utc};
use labvault_common::types::UNKNOWN_FILE_TYPE;

/// Prefix for names synthesized when nothing of the original base survives.
const FALLBACK_PREFIX: &str = "upload_";

/// Split `name` into base and extension, the extension keeping its dot.
pub fn split_extension(name: &str) -> (&str, &str) {
    let segment_start = name.rfind('/').map_or(0, |i| i + 1);

    let dot = match name.rfind('.') {
        Some(i) if i >= segment_start => i,
        _ => return (name, ""),
    };

    if name[segment_start..dot].chars().all(|c| c == '.') {
        return (name, "");
    }

    (&name[..dot], &name[dot..])
}

/// Safe file name: alphanumerics, `-` and `_`, plus at most one `.` before an
/// alphanumeric extension. Never empty.
pub fn sanitize_file_name(name: &str) -> String {
    sanitize_file_name_at(name, Utc::now())
}

pub(crate) fn sanitize_file_name_at(name: &str, now: DateTime<Utc>) -> String {
    let (base, ext) = split_extension(name);

    let mut clean_base = replace_disallowed(base);
    if clean_base.is_empty() {
        clean_base = format!("{}{}", FALLBACK_PREFIX, now.format("%Y%m%d%H%M%S%6f"));
    }

    let clean_ext: String = ext.chars().filter(|c| c.is_alphanumeric()).collect();
    if clean_ext.is_empty() {
        clean_base
    } else {
        format!("{}.{}", clean_base, clean_ext)
    }
}

/// Project identifier as a key prefix ending in `/`, or empty when nothing
/// usable remains.
pub fn sanitize_project_id(raw: &str) -> String {
    let cleaned = replace_disallowed(raw.trim());
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        String::new()
    } else {
        format!("{}/", cleaned)
    }
}

/// Uppercased extension of the original name, or `UNKNOWN`.
pub fn file_extension(original_name: &str) -> String {
    let (_, ext) = split_extension(original_name);
    let ext = ext.trim_start_matches('.');

    if ext.is_empty() {
        UNKNOWN_FILE_TYPE.to_string()
    } else {
        ext.to_uppercase()
    }
}

fn replace_disallowed(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap()
            + chrono::Duration::microseconds(123_456)
    }

    fn is_safe(name: &str) -> bool {
        !name.is_empty()
            && name.matches('.').count() <= 1
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.pdf"), ("report", ".pdf"));
        assert_eq!(split_extension("notes.MATLAB.mat"), ("notes.MATLAB", ".mat"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("..hidden.txt"), ("..hidden", ".txt"));
        assert_eq!(split_extension("dir.v2/data"), ("dir.v2/data", ""));
        assert_eq!(split_extension("archive."), ("archive", "."));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("my data (v2).csv"), "my_data__v2_.csv");
        assert_eq!(sanitize_file_name("run.tar.gz"), "run_tar.gz");
        assert_eq!(sanitize_file_name("weird.p-d!f"), "weird.pdf");
        assert_eq!(sanitize_file_name("archive."), "archive");
        assert_eq!(sanitize_file_name("trail.!!"), "trail");
        assert_eq!(sanitize_file_name(".bashrc"), "_bashrc");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "______etc_passwd");
    }

    #[test]
    fn test_empty_name_falls_back_to_timestamp() {
        assert_eq!(
            sanitize_file_name_at("", fixed_now()),
            "upload_20240301123045123456"
        );
    }

    #[test]
    fn test_sanitize_project_id() {
        assert_eq!(sanitize_project_id(""), "");
        assert_eq!(sanitize_project_id("   "), "");
        assert_eq!(sanitize_project_id("!!!"), "");
        assert_eq!(sanitize_project_id(" My Proj "), "My_Proj/");
        assert_eq!(sanitize_project_id("neuro-1"), "neuro-1/");
        assert_eq!(sanitize_project_id("_lab/42_"), "lab_42/");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("notes.MATLAB.mat"), "MAT");
        assert_eq!(file_extension("README"), "UNKNOWN");
        assert_eq!(file_extension("report.pdf"), "PDF");
        assert_eq!(file_extension(".env"), "UNKNOWN");
        assert_eq!(file_extension("archive."), "UNKNOWN");
    }

    proptest! {
        #[test]
        fn prop_sanitized_name_is_safe(name in any::<String>()) {
            let sanitized = sanitize_file_name(&name);
            prop_assert!(is_safe(&sanitized), "unsafe output {:?}", sanitized);
        }

        #[test]
        fn prop_sanitize_is_idempotent(name in any::<String>()) {
            let once = sanitize_file_name_at(&name, fixed_now());
            let twice = sanitize_file_name_at(&once, fixed_now());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_project_prefix_shape(raw in any::<String>()) {
            let prefix = sanitize_project_id(&raw);
            if !prefix.is_empty() {
                prop_assert!(prefix.ends_with('/'));
                let body = &prefix[..prefix.len() - 1];
                prop_assert!(!body.starts_with('_') && !body.ends_with('_'));
                prop_assert!(!body.contains('/'));
            }
        }
    }
}
