//! Output formatting for books, users and profiles (table, JSON, markdown, CSV).

use crate::bookmeter::{Book, Profile, User};
use crate::config::OutputFormat;

/// Formats scraped records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a list of books.
    pub fn format_books(&self, books: &[Book]) -> String {
        if books.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => BOOK_CSV_HEADER.to_string(),
                _ => "No books found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => json(books, "[]"),
            OutputFormat::Table => self.table_books(books),
            OutputFormat::Markdown => self.markdown_books(books),
            OutputFormat::Csv => self.csv_books(books),
        }
    }

    /// Formats a list of users.
    pub fn format_users(&self, users: &[User]) -> String {
        if users.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => USER_CSV_HEADER.to_string(),
                _ => "No users found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => json(users, "[]"),
            OutputFormat::Table => {
                let mut lines = vec![
                    format!("{:<10}  {:<30}  {}", "ID", "Name", "URL"),
                    format!("{:-<10}  {:-<30}  {:-<30}", "", "", ""),
                ];
                lines.extend(
                    users.iter().map(|u| format!("{:<10}  {:<30}  {}", u.id, truncate(&u.name, 30), u.uri)),
                );
                lines.push(String::new());
                lines.push(format!("Total: {} users", users.len()));
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines = vec!["| ID | Name |".to_string(), "|---|---|".to_string()];
                lines.extend(
                    users.iter().map(|u| format!("| {} | [{}]({}) |", u.id, escape_md(&u.name), u.uri)),
                );
                lines.join("\n")
            }
            OutputFormat::Csv => {
                let mut lines = vec![USER_CSV_HEADER.to_string()];
                lines.extend(users.iter().map(|u| {
                    format!("{},{},{}", escape_csv(&u.id), escape_csv(&u.name), escape_csv(&u.uri))
                }));
                lines.join("\n")
            }
        }
    }

    /// Formats a profile.
    pub fn format_profile(&self, profile: &Profile) -> String {
        match self.format {
            OutputFormat::Json => json(profile, "{}"),
            OutputFormat::Table => profile
                .attributes()
                .into_iter()
                .map(|(attr, value)| format!("{:<18} {}", format!("{}:", attr), value.unwrap_or("-")))
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Markdown => {
                let mut lines = vec![format!("## {}", profile.name), String::new()];
                lines.extend(
                    profile
                        .attributes()
                        .into_iter()
                        .skip(1)
                        .filter_map(|(attr, value)| Some(format!("- **{}:** {}", attr, value?))),
                );
                lines.join("\n")
            }
            OutputFormat::Csv => {
                let attributes = profile.attributes();
                let header: Vec<_> = attributes.iter().map(|(attr, _)| *attr).collect();
                let row: Vec<_> =
                    attributes.iter().map(|(_, value)| escape_csv(value.unwrap_or(""))).collect();
                format!("{}\n{}", header.join(","), row.join(","))
            }
        }
    }

    // Table formatting

    fn table_books(&self, books: &[Book]) -> String {
        let date_width = 10;
        let author_width = 20;
        let title_width = 50;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<date_width$}  {:<author_width$}  {}",
            "Read", "Author", "Title"
        ));
        lines.push(format!(
            "{:-<date_width$}  {:-<author_width$}  {:-<title_width$}",
            "", "", ""
        ));

        for book in books {
            let read = book
                .read_dates
                .first()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());

            let mut title = truncate(&book.name, title_width);
            if book.read_dates.len() > 1 {
                title.push_str(&format!(" (read {} times)", book.read_dates.len()));
            }

            lines.push(format!(
                "{:<date_width$}  {:<author_width$}  {}",
                read,
                truncate(&book.author, author_width),
                title
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} books", books.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_books(&self, books: &[Book]) -> String {
        let mut lines = Vec::new();

        lines.push("| Title | Author | Read |".to_string());
        lines.push("|---|---|---|".to_string());

        for book in books {
            lines.push(format!(
                "| [{}]({}) | {} | {} |",
                escape_md(&book.name),
                book.uri,
                escape_md(&book.author),
                join_dates(book, ", ")
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} books*", books.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_books(&self, books: &[Book]) -> String {
        let mut lines = vec![BOOK_CSV_HEADER.to_string()];

        for book in books {
            lines.push(format!(
                "{},{},{},{},{}",
                escape_csv(&book.name),
                escape_csv(&book.author),
                escape_csv(&join_dates(book, ";")),
                escape_csv(&book.uri),
                escape_csv(&book.image_uri)
            ));
        }

        lines.join("\n")
    }
}

const BOOK_CSV_HEADER: &str = "name,author,read_dates,uri,image_uri";

const USER_CSV_HEADER: &str = "id,name,uri";

fn json<T: serde::Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

fn join_dates(book: &Book, sep: &str) -> String {
    book.read_dates.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(sep)
}

/// Shortens `s` to at most `max` characters.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('[', "\\[").replace(']', "\\]")
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
