//! Field checks for post submissions and edits.
//!
//! Every check runs on every call; all offending fields are reported together.

use std::collections::HashSet;

use domains::{PostSubmission, ValidatedSubmission, ValidationErrors};
use url::Url;

pub const MAX_URL_LEN: usize = 500;
pub const MAX_CAPTION_LEN: usize = 1000;

const REQUIRED: &str = "This field is required.";

/// Checks a raw submission against the set of existing tag slugs.
pub fn validate_submission(
    raw: &PostSubmission,
    known_tags: &HashSet<String>,
) -> Result<ValidatedSubmission, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let url = raw.url.trim();
    check_url(url, &mut errors);
    let caption = raw.caption.trim();
    check_caption(caption, &mut errors);
    let tags = check_tags(&raw.tags, known_tags, &mut errors);

    errors.into_result()?;
    Ok(ValidatedSubmission {
        url: url.to_string(),
        caption: caption.to_string(),
        tags,
    })
}

/// Checks the editable part of an existing post: caption and tag selection.
pub fn validate_edit(
    caption: &str,
    tags: &[String],
    known_tags: &HashSet<String>,
) -> Result<(String, Vec<String>), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let caption = caption.trim();
    check_caption(caption, &mut errors);
    let tags = check_tags(tags, known_tags, &mut errors);
    errors.into_result()?;
    Ok((caption.to_string(), tags))
}

fn check_url(url: &str, errors: &mut ValidationErrors) {
    if url.is_empty() {
        errors.add("url", REQUIRED);
        return;
    }
    let len = url.chars().count();
    if len > MAX_URL_LEN {
        errors.add(
            "url",
            format!("Ensure this value has at most {MAX_URL_LEN} characters (it has {len})."),
        );
        return;
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => {}
        _ => errors.add("url", "Enter a valid URL."),
    }
}

fn check_caption(caption: &str, errors: &mut ValidationErrors) {
    if caption.is_empty() {
        errors.add("caption", REQUIRED);
        return;
    }
    let len = caption.chars().count();
    if len > MAX_CAPTION_LEN {
        errors.add(
            "caption",
            format!("Ensure this value has at most {MAX_CAPTION_LEN} characters (it has {len})."),
        );
    }
}

fn check_tags(
    raw: &[String],
    known_tags: &HashSet<String>,
    errors: &mut ValidationErrors,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let tags: Vec<String> = raw
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect();

    if tags.is_empty() {
        errors.add("tags", REQUIRED);
    } else if let Some(unknown) = tags.iter().find(|t| !known_tags.contains(*t)) {
        errors.add(
            "tags",
            format!("Select a valid choice. {unknown} is not one of the available choices."),
        );
    }
    tags
}
