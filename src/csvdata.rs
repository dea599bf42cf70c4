//! CSV preprocessing for data-analysis questions.
//!
//! Raw CSV is capped and re-delimited before it reaches the model: small
//! models cope much better with `" | "`-separated cells than with bare
//! commas, and 50 rows is plenty for the questions this pipeline serves.

/// Maximum number of rows (header included) passed to the model.
pub const MAX_ROWS: usize = 50;

/// Cap CSV content at [`MAX_ROWS`] lines and re-join each line's cells with
/// `" | "`. Quoted fields containing commas are kept intact.
pub fn prepare_csv(content: &str) -> String {
    let mut out = String::from("Voici les données du fichier CSV (50 premières lignes) :\n");
    for line in content.lines().filter(|l| !l.trim().is_empty()).take(MAX_ROWS) {
        out.push_str(&split_row(line).join(" | "));
        out.push('\n');
    }
    out
}

/// Split one CSV row on commas, honoring double-quoted fields.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                // Escaped quote inside a quoted field
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current).trim().to_string());
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}
