//! Delimited text concatenation

/// One source's block in the aggregate text file
pub(crate) fn delimited_block(source_name: &str, content: &str) -> String {
    format!("\n--- {source_name} ---\n{content}\n\n")
}

/// Whether an artifact carries any text worth keeping
pub(crate) fn has_content(content: &str) -> bool {
    !content.trim().is_empty()
}
