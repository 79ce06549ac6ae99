use std::sync::OnceLock;

use regex::Captures;
use regex::Regex;

use crate::error::Error;
use crate::review::ReviewMetadata;

/// Keys available in `--branch` templates.
const TEMPLATE_KEYS: [&str; 7] = [
    "id", "number", "project", "branch", "subject", "topic", "status",
];

/// Determine the review branch name.
///
/// - No name: `TOPIC--SUBJECT`, or `NUMBER--SUBJECT` if the change has no topic.
/// - A name containing `{{`: a template with `{{key}}` placeholders filled in from the change.
/// - Otherwise, the name itself.
pub fn branch_name(requested: Option<&str>, review: &ReviewMetadata) -> Result<String, Error> {
    match requested {
        None | Some("") => {
            let prefix = match &review.topic {
                Some(topic) if !topic.trim().is_empty() => topic.clone(),
                _ => review.number.to_string(),
            };
            Ok(format!(
                "{}--{}",
                dasherize(&prefix),
                dasherize(&review.subject)
            ))
        }
        Some(template) if template.contains("{{") => render_template(template, review),
        Some(name) => Ok(name.to_owned()),
    }
}

fn render_template(template: &str, review: &ReviewMetadata) -> Result<String, Error> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            \{\{
            [[:space:]]*
            (?P<key>[[:word:]]+)
            [[:space:]]*
            \}\}
            ",
        )
        .expect("Regex parses")
    });

    let mut error = None;
    let rendered = re.replace_all(template, |captures: &Captures| {
        let key = &captures["key"];
        match template_value(key, review) {
            Some(value) => dasherize(&value),
            None => {
                error.get_or_insert_with(|| Error::UnknownTemplateKey {
                    key: key.to_owned(),
                    known: TEMPLATE_KEYS.to_vec(),
                });
                String::new()
            }
        }
    });

    match error {
        Some(error) => Err(error),
        None => Ok(rendered.into_owned()),
    }
}

fn template_value(key: &str, review: &ReviewMetadata) -> Option<String> {
    Some(match key {
        "id" => review.id.to_string(),
        "number" => review.number.to_string(),
        "project" => review.project.clone(),
        "branch" => review.branch.clone(),
        "subject" => review.subject.clone(),
        "topic" => review.topic.clone().unwrap_or_default(),
        "status" => review.status.clone().unwrap_or_default(),
        _ => return None,
    })
}

/// Replace runs of whitespace with `-`.
fn dasherize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("-")
}
