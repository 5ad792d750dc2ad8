//! Narration text arrives with inline emphasis markup. Only bold
//! (`strong`/`b`), italic (`em`/`i`) and line breaks (`br`) survive; any
//! other tag is dropped while its text content is kept.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Bold,
    Italic,
    LineBreak,
}

fn classify_tag(name: &str) -> Option<Emphasis> {
    match name {
        "strong" | "b" => Some(Emphasis::Bold),
        "em" | "i" => Some(Emphasis::Italic),
        "br" => Some(Emphasis::LineBreak),
        _ => None,
    }
}

struct SpanBuilder {
    spans: Vec<NarrationSpan>,
    bold_depth: usize,
    italic_depth: usize,
}

impl SpanBuilder {
    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let text = decode_entities(raw);
        let bold = self.bold_depth > 0;
        let italic = self.italic_depth > 0;
        match self.spans.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(&text),
            _ => self.spans.push(NarrationSpan { text, bold, italic }),
        }
    }

    fn apply_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match (classify_tag(&name), closing) {
            (Some(Emphasis::Bold), false) => self.bold_depth += 1,
            (Some(Emphasis::Bold), true) => self.bold_depth = self.bold_depth.saturating_sub(1),
            (Some(Emphasis::Italic), false) => self.italic_depth += 1,
            (Some(Emphasis::Italic), true) => {
                self.italic_depth = self.italic_depth.saturating_sub(1)
            }
            (Some(Emphasis::LineBreak), _) => self.push_text("\n"),
            (None, _) => {}
        }
    }
}

pub fn parse_narration(markup: &str) -> Vec<NarrationSpan> {
    let mut builder = SpanBuilder {
        spans: Vec::new(),
        bold_depth: 0,
        italic_depth: 0,
    };

    let mut rest = markup;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        // `a < b`, `3<5` and `<b then c>` style text is not a tag.
        if !looks_like_tag(tag) {
            builder.push_text(&rest[..open + 1]);
            rest = &rest[open + 1..];
            continue;
        }
        builder.push_text(&rest[..open]);
        builder.apply_tag(tag);
        rest = &rest[open + close + 1..];
    }
    builder.push_text(rest);
    builder.spans
}

/// Accepts `name`, `/name`, `name/` and `name attr="..."` bodies. Bare words
/// after a tag name are prose, not attributes.
fn looks_like_tag(body: &str) -> bool {
    let unprefixed = body.strip_prefix('/').unwrap_or(body);
    if !unprefixed.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    let name_len = unprefixed
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(unprefixed.len());
    let after_name = &unprefixed[name_len..];
    if after_name.is_empty() {
        return true;
    }
    if !after_name.starts_with(|c: char| c.is_whitespace() || c == '/') {
        return false;
    }
    let attributes = after_name.trim().trim_end_matches('/').trim_end();
    attributes.is_empty() || attributes.contains('=')
}

/// Narration with all markup removed, for clipboard and terminal output.
pub fn plain_text(markup: &str) -> String {
    parse_narration(markup)
        .into_iter()
        .map(|span| span.text)
        .collect()
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    const ENTITIES: [(&str, &str); 6] = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", "\u{a0}"),
        ("&amp;", "&"),
    ];

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    'outer: while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        for (entity, replacement) in ENTITIES {
            if tail.starts_with(entity) {
                out.push_str(replacement);
                rest = &tail[entity.len()..];
                continue 'outer;
            }
        }
        out.push('&');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}
