//! Column-based tokenizer for GenBank flat files.
//!
//! Top-level fields use a 12-column name prefix, feature keys a 21-column
//! prefix. A line whose prefix region is blank continues the open field. Line
//! classification is a pure function of the current section and the line; the
//! [`Tokenizer`] folds continuation lines and emits closed fields as events.

/// Width of the top-level field name column.
pub const TOP_LEVEL_WIDTH: usize = 12;
/// Width of the feature key column.
pub const FEATURE_WIDTH: usize = 21;
/// Width of the position column on ORIGIN lines.
pub const ORIGIN_OFFSET: usize = 10;

/// Section of a record the tokenizer is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    TopLevel,
    Features,
    Origin,
}

/// Classification of a single (tab-expanded) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// The `//` record terminator.
    EndOfRecord,
    /// Blank prefix: the value extends the open field.
    Continuation(&'a str),
    /// A new top-level field such as `LOCUS` or `ORGANISM`.
    TopLevel { name: &'a str, value: &'a str },
    /// A new feature such as `gene` or `CDS`.
    Feature { key: &'a str, value: &'a str },
    /// Sequence characters from an ORIGIN line, position column removed.
    Bases(&'a str),
}

/// Split a line at a character column into trimmed name and value.
/// Lines not longer than the column are all name.
fn split_at_column(line: &str, width: usize) -> (&str, &str) {
    match line.char_indices().nth(width) {
        Some((idx, _)) => (line[..idx].trim(), line[idx..].trim()),
        None => (line.trim(), ""),
    }
}

/// Classify a line in the given section.
#[must_use]
pub fn classify_line(section: Section, line: &str) -> LineKind<'_> {
    if line.trim() == "//" {
        return LineKind::EndOfRecord;
    }
    match section {
        Section::TopLevel => top_level(line),
        Section::Features => {
            // Keywords in column 0 (ORIGIN, CONTIG, BASE COUNT) leave the feature table
            if line.starts_with(|c: char| !c.is_whitespace()) {
                return top_level(line);
            }
            let (key, value) = split_at_column(line, FEATURE_WIDTH);
            if key.is_empty() {
                LineKind::Continuation(value)
            } else if key == "ORIGIN" {
                LineKind::TopLevel { name: key, value }
            } else {
                LineKind::Feature { key, value }
            }
        }
        Section::Origin => match line.char_indices().nth(ORIGIN_OFFSET) {
            Some((idx, _)) => LineKind::Bases(&line[idx..]),
            None => LineKind::Bases(""),
        },
    }
}

fn top_level(line: &str) -> LineKind<'_> {
    let (name, value) = split_at_column(line, TOP_LEVEL_WIDTH);
    if name.is_empty() {
        LineKind::Continuation(value)
    } else {
        LineKind::TopLevel { name, value }
    }
}

/// Section entered after a top-level field with this name.
#[must_use]
pub fn section_after(current: Section, name: &str) -> Section {
    match name {
        "FEATURES" => Section::Features,
        "ORIGIN" => Section::Origin,
        _ if current == Section::Features => Section::TopLevel,
        _ => current,
    }
}

/// Whether a field is a top-level field or a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    TopLevel,
    Feature,
}

/// A field with its folded value and the 1-based lines it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldKind,
    pub name: String,
    pub value: String,
    pub start_line: u64,
    pub end_line: u64,
}

/// Tokenizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Field(Field),
    /// Uppercased bases with internal spaces removed.
    Bases(Vec<u8>),
    EndOfRecord,
}

/// Record tokenizer state machine.
#[derive(Debug, Default)]
pub struct Tokenizer {
    section: Section,
    open: Option<Field>,
    line_no: u64,
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Consume one line, appending any resulting events.
    pub fn push(&mut self, line: &str, events: &mut Vec<Event>) {
        self.line_no += 1;
        let expanded;
        let line = if line.contains('\t') {
            expanded = line.replace('\t', "    ");
            expanded.as_str()
        } else {
            line
        };

        match classify_line(self.section, line) {
            LineKind::EndOfRecord => {
                self.close(events);
                events.push(Event::EndOfRecord);
                self.section = Section::TopLevel;
            }
            LineKind::Continuation(value) => {
                if let Some(field) = self.open.as_mut() {
                    if !value.is_empty() {
                        if !field.value.is_empty() {
                            field.value.push('\n');
                        }
                        field.value.push_str(value);
                    }
                    field.end_line = self.line_no;
                }
            }
            LineKind::TopLevel { name, value } => {
                self.close(events);
                self.section = section_after(self.section, name);
                let field = self.open_field(FieldKind::TopLevel, name, value);
                if self.section == Section::TopLevel {
                    self.open = Some(field);
                } else {
                    // FEATURES and ORIGIN headers carry no continuation
                    events.push(Event::Field(field));
                }
            }
            LineKind::Feature { key, value } => {
                self.close(events);
                self.open = Some(self.open_field(FieldKind::Feature, key, value));
            }
            LineKind::Bases(raw) => {
                let bases: Vec<u8> = raw
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase())
                    .collect();
                if !bases.is_empty() {
                    events.push(Event::Bases(bases));
                }
            }
        }
    }

    /// Flush the open field at end of input.
    pub fn finish(&mut self, events: &mut Vec<Event>) {
        self.close(events);
        self.section = Section::TopLevel;
    }

    fn open_field(&self, kind: FieldKind, name: &str, value: &str) -> Field {
        Field {
            kind,
            name: name.to_string(),
            value: value.to_string(),
            start_line: self.line_no,
            end_line: self.line_no,
        }
    }

    fn close(&mut self, events: &mut Vec<Event>) {
        if let Some(field) = self.open.take() {
            events.push(Event::Field(field));
        }
    }
}
