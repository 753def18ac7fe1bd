use crate::document::SpecificationDocument;
use crate::error::{Result, SegmentError};
use crate::types::Span;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

fn section_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^##[ \t]+SECTION[ \t]+(\d+)[ \t]*:[ \t]*(.*?)[ \t]*$")
            .expect("section marker regex is valid")
    })
}

fn requirement_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^####[ \t]+FR-(\d+)\.(\d+)((?:\.\d+)*)[ \t]*:?[ \t]*(.*?)[ \t]*$")
            .expect("requirement marker regex is valid")
    })
}

fn integrated_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[ \t]*-[ \t]*INTEGRATED$").expect("suffix regex is valid")
    })
}

/// Any heading of level 1-3 closes the requirement above it.
fn is_coarse_heading(line: &str) -> bool {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    (1..=3).contains(&hashes)
        && line[hashes..].starts_with(|c: char| c == ' ' || c == '\t')
}

/// Fence character and run length if `line` opens or closes a code block.
fn fence(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = rest.chars().take_while(|c| *c == ch).count();
    (run >= 3).then_some((ch, run))
}

/// A closing fence repeats the opening character at least as many times and
/// carries no info string.
fn closes(open: (char, usize), line: &str) -> bool {
    match fence(line) {
        Some((ch, run)) => {
            ch == open.0 && run >= open.1 && line.trim()[run..].trim().is_empty()
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// A source line with its byte offset, stripped of its line terminator, and
/// whether it sits inside a fenced code block.
struct Line<'a> {
    number: usize,
    offset: usize,
    text: &'a str,
    fenced: bool,
}

/// Split `text` into lines, marking fenced ones. Also returns the line number
/// of a fence that is never closed.
fn lines(text: &str) -> (Vec<Line<'_>>, Option<usize>) {
    let mut out = Vec::new();
    let mut offset = 0;
    // (char, run length, line number) of the open fence
    let mut open: Option<(char, usize, usize)> = None;
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let body = raw.trim_end_matches(['\n', '\r']);
        let fenced = match open {
            Some((ch, run, _)) => {
                if closes((ch, run), body) {
                    open = None;
                }
                true
            }
            None => match fence(body) {
                Some((ch, run)) => {
                    open = Some((ch, run, idx + 1));
                    true
                }
                None => false,
            },
        };
        out.push(Line {
            number: idx + 1,
            offset,
            text: body,
            fenced,
        });
        offset += raw.len();
    }
    (out, open.map(|(_, _, line)| line))
}

// ---------------------------------------------------------------------------
// Outline types
// ---------------------------------------------------------------------------

/// A feature requirement heading and the span of text it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEntry {
    /// Compound ordinal as written, e.g. `1.2` or `1.2.1`.
    pub id: String,
    pub title: String,
    pub span: Span,
    pub line: usize,
}

impl RequirementEntry {
    pub fn label(&self) -> String {
        format!("FR-{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub number: u32,
    pub title: String,
    pub span: Span,
    pub line: usize,
    pub requirements: Vec<RequirementEntry>,
}

/// The parsed shape of a document: sections in execution order.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
}

impl Outline {
    pub fn requirement_count(&self) -> usize {
        self.sections.iter().map(|s| s.requirements.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split a document into sections and, within each, feature requirements.
///
/// Section spans tile the document from the first marker to the end; text
/// before the first marker belongs to no section. Duplicate section numbers
/// or requirement ids are errors. Sections written out of ascending order are
/// reordered with a warning.
pub fn parse(doc: &SpecificationDocument) -> Result<Outline> {
    let text = doc.text();
    let (lines, unterminated) = lines(text);
    let mut warnings = Vec::new();
    if let Some(line) = unterminated {
        let msg = format!(
            "unterminated code fence at line {line}; headings after it are ignored"
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    // Section markers: (line index, number, title)
    let mut markers = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.fenced {
            continue;
        }
        if let Some(caps) = section_marker().captures(line.text) {
            let Ok(number) = caps[1].parse::<u32>() else {
                let msg = format!(
                    "line {}: section ordinal '{}' is out of range, marker ignored",
                    line.number, &caps[1]
                );
                warn!("{msg}");
                warnings.push(msg);
                continue;
            };
            let title = integrated_suffix().replace(&caps[2], "").trim().to_string();
            let title = if title.is_empty() {
                "Untitled".to_string()
            } else {
                title
            };
            markers.push((idx, number, title));
        }
    }

    if let Some((first, _, _)) = markers.first() {
        if lines[*first].offset > 0 {
            debug!(bytes = lines[*first].offset, "ignoring preamble before first section");
        }
    }

    let mut seen: HashMap<u32, usize> = HashMap::new();
    let mut seen_requirements: HashMap<String, usize> = HashMap::new();
    let mut sections = Vec::with_capacity(markers.len());

    for (i, (start_idx, number, title)) in markers.iter().enumerate() {
        let end_idx = markers.get(i + 1).map(|m| m.0).unwrap_or(lines.len());
        let start = lines[*start_idx].offset;
        let end = lines.get(end_idx).map(|l| l.offset).unwrap_or(text.len());
        let line_no = lines[*start_idx].number;

        if let Some(first_line) = seen.insert(*number, line_no) {
            return Err(SegmentError::DuplicateSection {
                number: *number,
                first_line,
                line: line_no,
            });
        }

        let requirements = parse_requirements(
            &lines[start_idx + 1..end_idx],
            end,
            *number,
            &mut seen_requirements,
            &mut warnings,
        )?;

        sections.push(Section {
            number: *number,
            title: title.clone(),
            span: Span::new(start, end),
            line: line_no,
            requirements,
        });
    }

    if sections.windows(2).any(|w| w[0].number > w[1].number) {
        let msg = "sections are not in ascending order; executing by section number".to_string();
        warn!("{msg}");
        warnings.push(msg);
        sections.sort_by_key(|s| s.number);
    }

    Ok(Outline { sections, warnings })
}

fn parse_requirements(
    body: &[Line<'_>],
    section_end: usize,
    section_number: u32,
    seen: &mut HashMap<String, usize>,
    warnings: &mut Vec<String>,
) -> Result<Vec<RequirementEntry>> {
    let mut out: Vec<RequirementEntry> = Vec::new();
    let mut open: Option<(String, String, usize, usize)> = None;

    let close = |open: &mut Option<(String, String, usize, usize)>,
                 out: &mut Vec<RequirementEntry>,
                 end: usize| {
        if let Some((id, title, start, line)) = open.take() {
            out.push(RequirementEntry {
                id,
                title,
                span: Span::new(start, end),
                line,
            });
        }
    };

    for line in body {
        if line.fenced {
            continue;
        }
        if let Some(caps) = requirement_marker().captures(line.text) {
            close(&mut open, &mut out, line.offset);

            let id = format!("{}.{}{}", &caps[1], &caps[2], &caps[3]);
            let line_no = line.number;
            if seen.insert(id.clone(), line_no).is_some() {
                return Err(SegmentError::DuplicateRequirement { id, line: line_no });
            }
            if caps[1].parse::<u32>().ok() != Some(section_number) {
                let msg = format!(
                    "FR-{id} is declared inside section {section_number}; it stays with that section"
                );
                warn!("{msg}");
                warnings.push(msg);
            }
            let title = caps[4].trim().to_string();
            open = Some((id, title, line.offset, line_no));
        } else if is_coarse_heading(line.text) {
            close(&mut open, &mut out, line.offset);
        }
    }
    close(&mut open, &mut out, section_end);

    Ok(out)
}
