use std::path::Path;

use crate::error::IoError;

/// One line of a filter descriptor split into whitespace separated tokens.
pub type DescriptorLine = Vec<String>;

/// Split descriptor text into lines of tokens.
///
/// Leading and trailing whitespace is dropped. Blank lines are skipped except
/// the first one, which holds the tag and is kept even when empty so the
/// following fields never shift into its place. No value is interpreted here.
///
/// # Example
///
/// ```
/// use korrel_io::descriptor::tokenize_descriptor;
///
/// let lines = tokenize_descriptor("Sobel X\n1\n\n-1  1\n");
/// assert_eq!(lines, vec![vec!["Sobel", "X"], vec!["1"], vec!["-1", "1"]]);
/// ```
pub fn tokenize_descriptor(text: &str) -> Vec<DescriptorLine> {
    text.lines()
        .map(|line| {
            line.split_whitespace()
                .map(str::to_owned)
                .collect::<DescriptorLine>()
        })
        .enumerate()
        .filter(|(i, tokens)| *i == 0 || !tokens.is_empty())
        .map(|(_, tokens)| tokens)
        .collect()
}

/// Read a filter descriptor file and split it into lines of tokens.
///
/// # Arguments
///
/// * `file_path` - The path to the descriptor text file.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be read as UTF-8.
pub fn read_descriptor_tokens(
    file_path: impl AsRef<Path>,
) -> Result<Vec<DescriptorLine>, IoError> {
    let file_path = file_path.as_ref();

    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let text = std::fs::read_to_string(file_path)?;
    let lines = tokenize_descriptor(&text);

    log::debug!(
        "read {} descriptor lines from {}",
        lines.len(),
        file_path.display()
    );

    Ok(lines)
}
