use termimad::{FmtText, MadSkin};
use crate::output::{CompletionResult, HEADERS};

/// Escapes a cell so it stays inside one markdown table cell.
fn markdown_cell(cell: &str) -> String {
    cell.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace('\n', " ")
}

/// Results as a markdown table, one row per result.
pub fn results_to_markdown(results: &[CompletionResult]) -> String {
    rows_to_markdown(results.iter().map(|r| r.to_row()))
}

/// Any rows in [HEADERS] order as a markdown table.
pub fn rows_to_markdown<I>(rows: I) -> String
    where I: IntoIterator<Item=[String; 5]> {
    let mut markdown = format!("|{}|\n|{}|\n", HEADERS.join("|"), HEADERS.map(|_| ":-").join("|"));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| markdown_cell(cell)).collect();
        markdown.push('|');
        markdown.push_str(&cells.join("|"));
        markdown.push_str("|\n");
    }
    markdown
}

/// Prints markdown to the terminal with a skin, wrapping at `wrap_width` when given.
pub struct MarkdownPrinter {
    pub skin: MadSkin,
    pub wrap_width: Option<usize>,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self {
            skin: MadSkin::default(),
            wrap_width: None,
        }
    }
}

impl MarkdownPrinter {
    pub fn render(&self, markdown: &str) -> String {
        FmtText::from(&self.skin, markdown, self.wrap_width).to_string()
    }

    pub fn print(&self, markdown: &str) {
        print!("{}", self.render(markdown));
    }

    pub fn print_results(&self, results: &[CompletionResult]) {
        self.print(&results_to_markdown(results));
    }
}
