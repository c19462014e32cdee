//! Display projection of accumulated assistant text.
//!
//! `project` is a pure function: it is recomputed from the full text on
//! every update, and an unterminated code fence simply extends to the end of
//! the text until its closing fence arrives.

use markdown::{mdast, to_mdast, ParseOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Source text of consecutive non-code nodes, verbatim.
    Markdown(String),
    /// Fenced or indented code.
    Code {
        language: Option<String>,
        code: String,
    },
}

pub fn project(text: &str) -> Vec<Block> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let root = match to_mdast(text, &ParseOptions::gfm()) {
        Ok(node) => node,
        Err(_) => return vec![Block::Markdown(text.trim().to_owned())],
    };
    let nodes = match root {
        mdast::Node::Root(root) => root.children,
        other => vec![other],
    };

    let mut blocks = Vec::new();
    let mut run: Option<(usize, usize)> = None;
    for node in &nodes {
        if let mdast::Node::Code(code) = node {
            flush_run(text, &mut run, &mut blocks);
            blocks.push(Block::Code {
                language: code.lang.clone().filter(|lang| !lang.is_empty()),
                code: code.value.clone(),
            });
            continue;
        }

        let Some(position) = node.position() else {
            continue;
        };
        let (start, end) = (position.start.offset, position.end.offset);
        run = Some(match run {
            Some((run_start, _)) => (run_start, end),
            None => (start, end),
        });
    }
    flush_run(text, &mut run, &mut blocks);

    if blocks.is_empty() {
        blocks.push(Block::Markdown(text.trim().to_owned()));
    }
    blocks
}

fn flush_run(text: &str, run: &mut Option<(usize, usize)>, blocks: &mut Vec<Block>) {
    let Some((start, end)) = run.take() else {
        return;
    };
    let end = end.min(text.len());
    if let Some(slice) = text.get(start.min(end)..end) {
        let slice = slice.trim();
        if !slice.is_empty() {
            blocks.push(Block::Markdown(slice.to_owned()));
        }
    }
}
