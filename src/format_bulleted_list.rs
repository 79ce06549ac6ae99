use std::fmt::Display;

/// Format a list of items as a Markdown-style bulleted list, one item per line.
pub fn format_bulleted_list(items: impl IntoIterator<Item = impl Display>) -> String {
    items
        .into_iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
