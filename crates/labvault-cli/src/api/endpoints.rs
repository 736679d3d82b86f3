//! API endpoint URL builders

use labvault_common::types::SearchFilters;
use uuid::Uuid;

pub fn status_url(base_url: &str) -> String {
    format!("{}/status", base_url)
}

pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url)
}

pub fn upload_file_url(base_url: &str) -> String {
    format!("{}/uploadfile/", base_url)
}

pub fn upload_folder_url(base_url: &str) -> String {
    format!("{}/upload_folder/", base_url)
}

pub fn download_url(base_url: &str, file_id: Uuid) -> String {
    format!("{}/download/{}", base_url, file_id)
}

/// Build search URL. Absent and blank filters are left out.
pub fn search_url(base_url: &str, filters: &SearchFilters) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();

    if let Some(id) = filters.file_id {
        params.push(("file_id", id.to_string()));
    }

    let text = [
        ("project_id", &filters.project_id),
        ("author", &filters.author),
        ("file_type", &filters.file_type),
        ("experiment_type", &filters.experiment_type),
        ("tags_contain", &filters.tags_contain),
    ];
    for (name, value) in text {
        if let Some(value) = SearchFilters::text(value) {
            params.push((name, value.to_string()));
        }
    }

    if let Some(date) = filters.date_after {
        params.push(("date_after", date.to_string()));
    }
    if let Some(date) = filters.date_before {
        params.push(("date_before", date.to_string()));
    }
    if let Some(limit) = filters.limit {
        params.push(("limit", limit.to_string()));
    }

    with_query(format!("{}/search", base_url), &params)
}

/// Build orphan report URL
pub fn orphans_url(base_url: &str, prefix: Option<&str>, limit: Option<usize>) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(prefix) = prefix {
        params.push(("prefix", prefix.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }

    with_query(format!("{}/admin/orphans", base_url), &params)
}

fn with_query(mut url: String, params: &[(&str, String)]) -> String {
    for (i, (name, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(name);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}
