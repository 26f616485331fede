//! Section scanning for fetched rule text.
//!
//! Rule definitions are line-oriented: sections start with `@TABLE`, `@TREE`,
//! `@COLORS` or `@ICONS` at the beginning of a line. Fetched responses may
//! wrap the definition in markup; everything before the first section and
//! everything after a closing markup tag is dropped. Only the first
//! `@TABLE`/`@TREE` section becomes the rule body; `@COLORS` and `@ICONS`
//! are captured verbatim for downstream renderers.

/// Sections extracted from one fetched rule definition.
#[derive(Debug, Clone)]
pub struct RuleSections {
    /// Name from an `@RULE` header, when present.
    pub declared_name: Option<String>,
    /// Whether the body came from `@TREE` rather than `@TABLE`.
    pub is_tree: bool,
    /// The `@TABLE`/`@TREE` body, header line excluded.
    pub body: String,
    pub colours: Option<String>,
    pub icons: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Body,
    Colours,
    Icons,
    Other,
}

/// Scans `text` for the first `@TABLE`/`@TREE` section.
///
/// Returns `None` when the text contains no decodable section.
#[must_use]
pub fn scan_sections(text: &str) -> Option<RuleSections> {
    let mut declared_name = None;
    let mut is_tree = false;
    let mut body: Option<String> = None;
    let mut colours: Option<String> = None;
    let mut icons: Option<String> = None;
    let mut current: Option<Section> = None;

    for raw in text.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();

        // Closing markup ends the scan; the definition is over.
        if trimmed.starts_with("</") {
            break;
        }

        if let Some(header) = trimmed.strip_prefix('@') {
            let mut words = header.split_whitespace();
            let keyword = words.next().unwrap_or("").to_ascii_uppercase();
            current = Some(match keyword.as_str() {
                "TABLE" if body.is_none() => {
                    is_tree = false;
                    body = Some(String::new());
                    Section::Body
                }
                "TREE" if body.is_none() => {
                    is_tree = true;
                    body = Some(String::new());
                    Section::Body
                }
                "COLORS" | "COLOURS" => {
                    colours.get_or_insert_with(String::new);
                    Section::Colours
                }
                "ICONS" => {
                    icons.get_or_insert_with(String::new);
                    Section::Icons
                }
                "RULE" => {
                    if declared_name.is_none() {
                        declared_name = words.next().map(str::to_string);
                    }
                    Section::Other
                }
                _ => Section::Other,
            });
            continue;
        }

        let target = match current {
            Some(Section::Body) => body.as_mut(),
            Some(Section::Colours) => colours.as_mut(),
            Some(Section::Icons) => icons.as_mut(),
            // Lines before the first section or inside unknown sections are
            // surrounding markup.
            Some(Section::Other) | None => None,
        };
        if let Some(buffer) = target {
            buffer.push_str(line);
            buffer.push('\n');
        }
    }

    body.map(|body| RuleSections {
        declared_name,
        is_tree,
        body,
        colours,
        icons,
    })
}
