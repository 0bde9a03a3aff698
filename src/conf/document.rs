//! Line-oriented model of a Hyprland `monitors.conf`.
//!
//! The file is split into records.  Two kinds are understood:
//!
//! * **v1** single-line rules:
//!   `monitor = <name>, <resolution>, <position>, <scale>[, <flags>...]`
//! * **v2** blocks:
//!
//!   ```text
//!   monitorv2 {
//!       output = eDP-1
//!       mode = 1920x1080@60
//!       scale = 1.25
//!   }
//!   ```
//!
//! Everything else (comments, variables, other keywords, unterminated
//! blocks, ...) is kept as an opaque verbatim line.  Rendering a parsed
//! [`Document`] with `to_string()` reproduces the input byte for byte; an
//! edit only touches the one value it targets.

use std::fmt;

/// What [`Document::set_scale`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Replaced the `scale` value of a v2 block.
    BlockScaleUpdated,
    /// Inserted a `scale` line into a v2 block that had none.
    BlockScaleInserted,
    /// Rewrote the scale field of a v1 `monitor =` line.
    LineUpdated,
    /// No entry existed; appended a new v1 line.
    Appended,
}

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Record {
    Verbatim(String),
    Line(MonitorLine),
    Block(MonitorBlock),
}

/// A v1 `monitor = name, ...` line, split into the parts an edit needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MonitorLine {
    /// Everything up to the monitor name, e.g. `"monitor = "`.
    head: String,
    /// The name exactly as written (may carry trailing whitespace).
    name: String,
    /// Comma-separated fields after the name, starting with the first `,`.
    fields: String,
    /// Trailing `# comment`, including the whitespace before it.
    comment: String,
    eol: String,
}

/// A complete `monitorv2 { ... }` block, header and closing line included.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MonitorBlock {
    lines: Vec<String>,
}

//  Lexical helpers

/// Split a raw line into content and line terminator (`\n`, `\r\n` or
/// nothing on the last line).
fn split_eol(line: &str) -> (&str, &str) {
    let content = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
    (content, &line[content.len()..])
}

/// Split content into code and trailing comment.  The whitespace in front
/// of `#` belongs to the comment.
fn split_comment(content: &str) -> (&str, &str) {
    match content.find('#') {
        Some(hash) => {
            let code = content[..hash].trim_end();
            (code, &content[code.len()..])
        }
        None => (content, ""),
    }
}

/// For `key = value` code, return the trimmed key and the byte offset where
/// the value starts (after the whitespace following `=`).
fn key_value(code: &str) -> Option<(&str, usize)> {
    let eq = code.find('=')?;
    let after = &code[eq + 1..];
    let value_start = eq + 1 + (after.len() - after.trim_start().len());
    Some((code[..eq].trim(), value_start))
}

/// Leading whitespace of `content`.
fn indentation(content: &str) -> &str {
    &content[..content.len() - content.trim_start().len()]
}

/// Replace `field`'s text while keeping the whitespace around it.
fn replace_trimmed(field: &str, value: &str) -> String {
    if field.trim().is_empty() {
        return format!(" {}", value);
    }
    let start = field.len() - field.trim_start().len();
    let end = field.trim_end().len();
    format!("{}{}{}", &field[..start], value, &field[end..])
}

fn is_disable(field: &str) -> bool {
    matches!(field.trim(), "disable" | "disabled")
}

//  v1 lines

impl MonitorLine {
    fn parse(line: &str) -> Option<Self> {
        let (content, eol) = split_eol(line);
        let (code, comment) = split_comment(content);
        let (key, value_start) = key_value(code)?;
        if key != "monitor" {
            return None;
        }
        let rest = &code[value_start..];
        let comma = rest.find(',')?;
        Some(Self {
            head: code[..value_start].to_string(),
            name: rest[..comma].to_string(),
            fields: rest[comma..].to_string(),
            comment: comment.to_string(),
            eol: eol.to_string(),
        })
    }

    fn name(&self) -> &str {
        self.name.trim()
    }

    /// Split into fields.  Index 0 is always the empty text before the
    /// first comma, so the scale lives at index 3.
    fn parts(&self) -> Vec<&str> {
        self.fields.split(',').collect()
    }

    fn set_scale(&mut self, scale: &str) {
        let mut parts: Vec<String> = self.parts().into_iter().map(String::from).collect();
        let value = format!(" {}", scale);
        match parts.len() {
            2 if is_disable(&parts[1]) => {
                parts = vec![String::new(), " preferred".into(), " auto".into(), value];
            }
            2 => {
                parts.push(" auto".into());
                parts.push(value);
            }
            3 => parts.push(value),
            _ => parts[3] = replace_trimmed(&parts[3], scale),
        }
        self.fields = parts.join(",");
    }
}

impl fmt::Display for MonitorLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}{}", self.head, self.name, self.fields, self.comment, self.eol)
    }
}

//  v2 blocks

/// `monitorv2 {` on a line of its own (comments allowed).
fn opens_block(line: &str) -> bool {
    let (code, _) = split_comment(split_eol(line).0);
    code.trim()
        .strip_prefix("monitorv2")
        .map(|rest| rest.trim_start() == "{")
        .unwrap_or(false)
}

fn closes_block(line: &str) -> bool {
    split_comment(split_eol(line).0).0.contains('}')
}

/// The value of `key` if `line` is a `key = value` line.
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (code, _) = split_comment(split_eol(line).0);
    let (k, value_start) = key_value(code)?;
    if k == key {
        Some(code[value_start..].trim_end())
    } else {
        None
    }
}

/// Rewrite the value of a `key = value` line, keeping everything else.
fn replace_value(line: &str, key: &str, value: &str) -> Option<String> {
    let (content, eol) = split_eol(line);
    let (code, comment) = split_comment(content);
    let (k, value_start) = key_value(code)?;
    if k != key {
        return None;
    }
    let value_end = value_start + code[value_start..].trim_end().len();
    Some(format!(
        "{}{}{}{}{}",
        &code[..value_start],
        value,
        &code[value_end..],
        comment,
        eol
    ))
}

impl MonitorBlock {
    /// Lines between the header and the closing brace.
    fn body(&self) -> &[String] {
        &self.lines[1..self.lines.len() - 1]
    }

    fn output(&self) -> Option<&str> {
        self.body().iter().find_map(|l| field_value(l, "output"))
    }

    fn set_scale(&mut self, scale: &str) -> Edit {
        let close = self.lines.len() - 1;
        for line in &mut self.lines[1..close] {
            if let Some(updated) = replace_value(line, "scale", scale) {
                *line = updated;
                return Edit::BlockScaleUpdated;
            }
        }

        let indent = self
            .body()
            .iter()
            .find(|l| field_value(l, "output").is_some())
            .map(|l| indentation(split_eol(l).0).to_string())
            .unwrap_or_else(|| "    ".into());
        let eol = match split_eol(&self.lines[0]).1 {
            "" => "\n",
            eol => eol,
        };
        let line = format!("{}scale = {}{}", indent, scale, eol);
        self.lines.insert(close, line);
        Edit::BlockScaleInserted
    }
}

impl fmt::Display for MonitorBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

//  Document

impl Document {
    /// Parse `text`.  Never fails: anything unrecognised is kept verbatim.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            if opens_block(line) {
                // A nested header means this block was never closed.
                let end = (i + 1..lines.len())
                    .find(|&j| closes_block(lines[j]) || opens_block(lines[j]))
                    .filter(|&j| closes_block(lines[j]));
                if let Some(end) = end {
                    records.push(Record::Block(MonitorBlock {
                        lines: lines[i..=end].iter().map(|l| l.to_string()).collect(),
                    }));
                    i = end + 1;
                    continue;
                }
            }
            records.push(match MonitorLine::parse(line) {
                Some(entry) => Record::Line(entry),
                None => Record::Verbatim(line.to_string()),
            });
            i += 1;
        }

        Self { records }
    }

    /// Set `monitor`'s scale to the already-formatted `scale`.
    ///
    /// The first v2 block whose `output` matches wins; then the first v1
    /// line with that name; otherwise a new v1 line is appended.
    pub fn set_scale(&mut self, monitor: &str, scale: &str) -> Edit {
        for record in &mut self.records {
            if let Record::Block(block) = record {
                if block.output() == Some(monitor) {
                    return block.set_scale(scale);
                }
            }
        }

        for record in &mut self.records {
            if let Record::Line(line) = record {
                if line.name() == monitor {
                    line.set_scale(scale);
                    return Edit::LineUpdated;
                }
            }
        }

        self.append(monitor, scale);
        Edit::Appended
    }

    fn append(&mut self, monitor: &str, scale: &str) {
        if !self.records.is_empty() && !self.to_string().ends_with('\n') {
            self.records.push(Record::Verbatim("\n".into()));
        }
        let line = format!("monitor = {}, preferred, auto, {}\n", monitor, scale);
        match MonitorLine::parse(&line) {
            Some(entry) => self.records.push(Record::Line(entry)),
            None => self.records.push(Record::Verbatim(line)),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            match record {
                Record::Verbatim(text) => f.write_str(text)?,
                Record::Line(line) => write!(f, "{}", line)?,
                Record::Block(block) => write!(f, "{}", block)?,
            }
        }
        Ok(())
    }
}
