//! Entity summary generation prompt.

use crate::llm_client::Message;
use crate::nodes::Entity;

/// Relationship context placed in the prompt.
#[derive(Debug, Clone, Copy)]
pub enum TripleContext<'a> {
    /// Every rendered triple, written as a bracketed list of single-quoted
    /// strings with backslash escapes (`['1: ...', '2: ...']`).
    Lines(&'a [String]),
    /// A pre-assembled, newline-separated block.
    Block(&'a str),
}

impl TripleContext<'_> {
    fn render(&self) -> String {
        match self {
            TripleContext::Lines(lines) => {
                let items: Vec<String> = lines.iter().map(|l| quote_item(l)).collect();
                format!("[{}]", items.join(", "))
            }
            TripleContext::Block(block) => (*block).to_string(),
        }
    }
}

/// Quote one list item. Single quotes unless the text contains a single quote
/// and no double quote.
fn quote_item(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Build the single user message asking the model to summarize `entity`.
pub fn build(entity: &Entity, triples: TripleContext<'_>) -> Vec<Message> {
    let content = format!(
        "Provide a comprehensive yet concise summary of the given entity, incorporating its description and associated triples:

Entity: {name}, {description}
Description: {description}
Triples: {triples}

Your summary should:
1. Clearly define the entity's core concept or purpose
2. Highlight key relationships or attributes from the triples
3. Integrate any relevant information from the existing description
4. Maintain a neutral, factual tone
5. Be approximately 2-3 sentences long

Ensure the summary is coherent, informative, and captures the essence of the entity within the context of the provided information.",
        name = entity.name,
        description = entity.description,
        triples = triples.render(),
    );
    vec![Message::user(content)]
}
