use super::context::{is_visibility_line, method_signature, FileContext};
use super::{Line, LineScanner, SourceFacts};
use log::debug;

/// Separator between the buffered lines of a doc comment.
pub const LINE_BREAK: char = '\r';

#[derive(Debug, Default)]
enum State {
    #[default]
    SeekingStart,
    InComment(Vec<String>),
    AwaitingSignature(String),
}

/// Associates `/** ... */` comments with the method signature that follows them.
#[derive(Debug, Default)]
pub struct DocCommentScanner {
    state: State,
}

impl DocCommentScanner {
    fn start_comment(&mut self, after_opener: &str) {
        match after_opener.find("*/") {
            Some(end) => {
                self.state = State::AwaitingSignature(after_opener[..end].trim().to_string());
            }
            None => {
                self.state = State::InComment(vec![after_opener.trim().to_string()]);
            }
        }
    }
}

impl LineScanner for DocCommentScanner {
    fn scan_line(&mut self, line: &Line<'_>, ctx: &FileContext, facts: &mut SourceFacts) {
        match std::mem::take(&mut self.state) {
            State::SeekingStart => {
                if let Some(start) = line.raw.find("/**") {
                    self.start_comment(&line.raw[start + 3..]);
                }
            }
            State::InComment(mut buffer) => match line.raw.find("*/") {
                Some(end) => {
                    buffer.push(line.raw[..end].trim().to_string());
                    let text = buffer.join(&LINE_BREAK.to_string());
                    self.state = State::AwaitingSignature(text);
                }
                None => {
                    buffer.push(line.raw.trim().to_string());
                    self.state = State::InComment(buffer);
                }
            },
            State::AwaitingSignature(text) => {
                if let Some(start) = line.raw.find("/**") {
                    self.start_comment(&line.raw[start + 3..]);
                } else if let Some(signature) = method_signature(line.tokens) {
                    if let Some(owner) = ctx.current_type() {
                        debug!("Doc comment for {}.{}", owner, signature.name);
                        facts
                            .doc_comments
                            .insert((owner.to_string(), signature.name), text);
                    }
                } else if !is_visibility_line(line.tokens) {
                    self.state = State::AwaitingSignature(text);
                }
            }
        }
    }
}

/// Turn buffered comment text into plain prose: leading `*` gutters and blank lines
/// are removed, `@` tags are kept as their own lines.
pub fn clean_doc_text(text: &str) -> String {
    text.split(LINE_BREAK)
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
