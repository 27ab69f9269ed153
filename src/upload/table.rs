use crate::upload::config::TableSettings;
use crate::upload::record::UploadRecord;
use crate::upload::util::{line_ending, split_lines};

/// Maintains the upload table inside a Markdown document.
///
/// The table is found by a literal header signature, not parsed as Markdown,
/// so surrounding prose and extra columns are tolerated. Rendering is not
/// idempotent: the same record rendered twice produces two rows.
#[derive(Debug, Clone)]
pub struct TableRenderer {
    settings: TableSettings,
}

fn split_cells(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

fn normalized_cells(line: &str) -> String {
    split_cells(line).join(" | ")
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.contains('-') || !trimmed.contains('|') {
        return false;
    }
    split_cells(trimmed).iter().all(|cell| {
        !cell.is_empty() && cell.chars().all(|ch| ch == '-' || ch == ':')
    })
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Last path component without its extension. Leading-dot names keep the dot.
fn link_text(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

impl TableRenderer {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    /// Labels joined by ` | `, the text a header line must contain.
    pub fn signature(&self) -> String {
        self.settings.header_labels.join(" | ")
    }

    pub fn header_line(&self) -> String {
        format!("| {} |", self.signature())
    }

    pub fn separator_line(&self) -> String {
        let cells = self
            .settings
            .header_labels
            .iter()
            .map(|label| "-".repeat(label.chars().count().max(3) + 2))
            .collect::<Vec<_>>();
        format!("|{}|", cells.join("|"))
    }

    fn is_header(&self, line: &str, signature: &str) -> bool {
        line.contains('|') && normalized_cells(line).contains(signature)
    }

    /// Index of the first line carrying the header signature.
    pub fn find_header(&self, document: &str) -> Option<usize> {
        let signature = self.signature();
        document
            .split('\n')
            .position(|line| self.is_header(line, &signature))
    }

    pub fn count_headers(&self, document: &str) -> usize {
        let signature = self.signature();
        document
            .split('\n')
            .filter(|line| self.is_header(line, &signature))
            .count()
    }

    /// Link target: `path` minus the configured root prefix, with `/`
    /// separators, spaces encoded as `%20` and pipes as `%7C`.
    pub fn link_target(&self, path: &str) -> String {
        let path = path.replace('\\', "/");
        let root = self.settings.link_root.replace('\\', "/");
        let relative = if root.is_empty() {
            path.as_str()
        } else {
            path.strip_prefix(root.as_str()).unwrap_or(path.as_str())
        };
        relative.replace(' ', "%20").replace('|', "%7C")
    }

    pub fn format_row(&self, record: &UploadRecord) -> String {
        let path = record.path.replace('\\', "/");
        format!(
            "| {} | {} | [{}]({}) |",
            escape_cell(&record.filename),
            escape_cell(&record.formatted_date),
            escape_cell(link_text(&path)),
            self.link_target(&path),
        )
    }

    /// Skeleton for a document that does not exist yet.
    pub fn new_document(&self, now: &str) -> String {
        let mut out = String::new();
        if self.settings.front_matter {
            out.push_str("---\n");
            out.push_str(&format!("title: {}\n", self.settings.title));
            out.push_str(&format!("date: {now}\n"));
            out.push_str(&format!("lastmod: {now}\n"));
            out.push_str("---\n\n");
        }
        out.push_str(&format!("# {}\n\n", self.settings.title));
        if !self.settings.intro.trim().is_empty() {
            out.push_str(self.settings.intro.trim());
            out.push_str("\n\n");
        }
        out.push_str(&self.header_line());
        out.push('\n');
        out.push_str(&self.separator_line());
        out.push('\n');
        out
    }

    /// Insert `records` (newest first) as one block directly under the
    /// header separator. A missing table is appended to the end.
    pub fn render(&self, document: &str, records: &[UploadRecord]) -> String {
        let rows = records
            .iter()
            .map(|record| self.format_row(record))
            .collect::<Vec<_>>();

        let eol = line_ending(document);
        let mut lines = split_lines(document)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let insert_at = match self.find_header(document) {
            Some(header_idx) => {
                let next = header_idx + 1;
                if !lines.get(next).is_some_and(|line| is_separator_row(line)) {
                    lines.insert(next, self.separator_line());
                }
                next + 1
            }
            None => return self.append_table(document, &rows, eol),
        };

        let tail = lines.split_off(insert_at);
        lines.extend(rows);
        lines.extend(tail);
        lines.join(eol)
    }

    fn append_table(&self, document: &str, rows: &[String], eol: &str) -> String {
        let mut out = document.to_string();
        if !out.is_empty() {
            if !out.ends_with('\n') {
                out.push_str(eol);
            }
            out.push_str(eol);
        }
        out.push_str(&self.header_line());
        out.push_str(eol);
        out.push_str(&self.separator_line());
        out.push_str(eol);
        for row in rows {
            out.push_str(row);
            out.push_str(eol);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TableRenderer {
        TableRenderer::new(TableSettings::default())
    }

    fn record(name: &str, date: &str) -> UploadRecord {
        UploadRecord {
            filename: name.to_string(),
            path: format!("src/upload/assets/{name}"),
            timestamp: "2024-03-01T12:00:00+00:00".to_string(),
            formatted_date: date.to_string(),
            batch_timestamp: None,
            upload_time: None,
            uploader: None,
        }
    }

    fn data_rows(doc: &str) -> Vec<&str> {
        doc.lines()
            .filter(|line| line.starts_with("| ") && line.contains("]("))
            .collect()
    }

    #[test]
    fn link_derivation_strips_root_and_encodes_spaces() {
        let r = renderer();
        assert_eq!(
            r.link_target("src/upload/assets/My File.docx"),
            "assets/My%20File.docx"
        );
        assert_eq!(link_text("src/upload/assets/My File.docx"), "My File");

        let custom = TableRenderer::new(TableSettings {
            link_root: "a/".to_string(),
            ..TableSettings::default()
        });
        assert_eq!(custom.link_target("a/b/c name.ext"), "b/c%20name.ext");
        assert_eq!(custom.link_target("other/c.ext"), "other/c.ext");
        assert_eq!(link_text("a/b/c name.ext"), "c name");
        assert_eq!(link_text("a/.hidden"), ".hidden");
        assert_eq!(link_text("a/archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn row_escapes_pipes() {
        let row = renderer().format_row(&record("a|b.txt", "2024-03-01 12:00:00"));
        assert_eq!(
            row,
            "| a\\|b.txt | 2024-03-01 12:00:00 | [a\\|b](assets/a%7Cb.txt) |"
        );
    }

    #[test]
    fn rows_go_directly_under_separator_ahead_of_existing_rows() {
        let r = renderer();
        let doc = "# Files\n\nIntro text.\n\n| File Name | Upload Time | Link |\n|---|---|---|\n| old.txt | 2023-01-01 00:00:00 | [old](assets/old.txt) |\n\nFooter prose.\n";
        let out = r.render(
            doc,
            &[
                record("new.txt", "2024-03-02 00:00:00"),
                record("mid.txt", "2024-03-01 00:00:00"),
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[4], "| File Name | Upload Time | Link |");
        assert_eq!(lines[5], "|---|---|---|");
        assert!(lines[6].starts_with("| new.txt |"));
        assert!(lines[7].starts_with("| mid.txt |"));
        assert!(lines[8].starts_with("| old.txt |"));
        assert!(out.starts_with("# Files\n\nIntro text.\n"));
        assert!(out.ends_with("\nFooter prose.\n"));
    }

    #[test]
    fn header_detection_tolerates_spacing_and_extra_columns() {
        let r = renderer();
        let doc = "|File Name|Upload Time|Link|Notes|\n|:--|:--|:--|---|\n";
        assert_eq!(r.find_header(doc), Some(0));
        let out = r.render(doc, &[record("a.txt", "2024-03-01 00:00:00")]);
        assert_eq!(out.lines().nth(2).map(|l| l.starts_with("| a.txt |")), Some(true));
        assert_eq!(r.count_headers(&out), 1);
    }

    #[test]
    fn missing_separator_is_restored() {
        let r = renderer();
        let doc = "# Files\n| File Name | Upload Time | Link |";
        let out = r.render(doc, &[record("a.txt", "2024-03-01 00:00:00")]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "| File Name | Upload Time | Link |");
        assert!(is_separator_row(lines[2]));
        assert!(lines[3].starts_with("| a.txt |"));
    }

    #[test]
    fn absent_header_appends_table_after_content() {
        let r = renderer();
        let doc = "# Notes\n\nSomething unrelated.";
        let out = r.render(doc, &[record("a.txt", "2024-03-01 00:00:00")]);
        assert!(out.starts_with("# Notes\n\nSomething unrelated.\n\n| File Name |"));
        assert_eq!(r.count_headers(&out), 1);
        assert_eq!(data_rows(&out).len(), 1);
    }

    #[test]
    fn new_document_has_one_header_and_rows_in_order() {
        let r = renderer();
        let skeleton = r.new_document("2024-03-01 00:00:00");
        let out = r.render(
            &skeleton,
            &[
                record("c.txt", "2024-03-03 00:00:00"),
                record("b.txt", "2024-03-02 00:00:00"),
                record("a.txt", "2024-03-01 00:00:00"),
            ],
        );
        assert!(out.starts_with("---\ntitle: Uploaded Files\n"));
        assert_eq!(r.count_headers(&out), 1);
        assert_eq!(out.lines().filter(|l| is_separator_row(l)).count(), 1);
        let rows = data_rows(&out);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("| c.txt |"));
        assert!(rows[1].starts_with("| b.txt |"));
        assert!(rows[2].starts_with("| a.txt |"));
        assert!(out.ends_with("|\n"));
    }

    #[test]
    fn rendering_twice_duplicates_rows() {
        let r = renderer();
        let rec = record("dup.txt", "2024-03-01 00:00:00");
        let once = r.render(&r.new_document("now"), std::slice::from_ref(&rec));
        let twice = r.render(&once, std::slice::from_ref(&rec));
        assert_eq!(r.find_header(&twice), r.find_header(&once));
        assert_eq!(r.count_headers(&twice), 1);
        let rows = data_rows(&twice);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn crlf_documents_keep_crlf_throughout() {
        let r = renderer();
        let doc = "# Files\r\n| File Name | Upload Time | Link |\r\n| old.txt | x | [old](o) |\r\n";
        let out = r.render(doc, &[record("a.txt", "2024-03-01 00:00:00")]);
        assert_eq!(out.matches('\n').count(), out.matches("\r\n").count());
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert!(is_separator_row(lines[2]));
        assert!(lines[3].starts_with("| a.txt |"));
        assert!(lines[4].starts_with("| old.txt |"));
        assert!(out.ends_with("|\r\n"));

        let appended = r.render("# Notes\r\nprose\r\n", &[record("b.txt", "d")]);
        assert_eq!(appended.matches('\n').count(), appended.matches("\r\n").count());
        assert!(appended.starts_with("# Notes\r\nprose\r\n\r\n| File Name |"));
    }

    #[test]
    fn configured_labels_match_existing_tables() {
        let r = TableRenderer::new(TableSettings {
            header_labels: vec!["文件名".into(), "上传时间".into(), "文件路径".into()],
            ..TableSettings::default()
        });
        let doc = "| 文件名 | 上传时间 | 文件路径 |\n|---|---|---|\n| old.txt | x | [old](o) |\n";
        assert_eq!(r.find_header(doc), Some(0));
        let out = r.render(doc, &[record("a.txt", "2024-03-01 00:00:00")]);
        assert_eq!(r.count_headers(&out), 1);
        assert!(out.lines().nth(2).is_some_and(|l| l.starts_with("| a.txt |")));
        assert_eq!(renderer().find_header(doc), None);
    }

    #[test]
    fn separator_detection() {
        assert!(is_separator_row("|---|---|"));
        assert!(is_separator_row("| :-- | --: |"));
        assert!(!is_separator_row("---"));
        assert!(!is_separator_row("| a | b |"));
    }
}
