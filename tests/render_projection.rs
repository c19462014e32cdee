mod fixture;

use fixture::{decode_whole, read_fixture};
use pretty_assertions::assert_eq;
use stream_transcript::{parse_frame, project, Block, FrameEvent, WireFormat};

fn fixture_reply() -> String {
    decode_whole(WireFormat::TokenStream, &read_fixture("token_stream_reply.txt"))
        .iter()
        .filter_map(|payload| match parse_frame(payload) {
            Ok(FrameEvent::TokenFragment(text)) => Some(text),
            _ => None,
        })
        .collect()
}

#[test]
fn finished_reply_projects_to_prose_code_prose() {
    assert_eq!(
        project(&fixture_reply()),
        vec![
            Block::Markdown("Here is a café example:".to_owned()),
            Block::Code {
                language: Some("rust".to_owned()),
                code: "fn main() {\n    println!(\"日本\");\n}".to_owned(),
            },
            Block::Markdown("Done. ✅".to_owned()),
        ]
    );
}

#[test]
fn every_streamed_prefix_projects_to_some_block() {
    let reply = fixture_reply();
    for (offset, _) in reply.char_indices().skip(1) {
        let prefix = &reply[..offset];
        if prefix.trim().is_empty() {
            continue;
        }
        assert!(!project(prefix).is_empty(), "prefix {prefix:?}");
    }
}

#[test]
fn open_fence_becomes_code_as_soon_as_it_starts() {
    let reply = fixture_reply();
    let fence = reply.find("```rust").expect("fence");
    let prefix = &reply[..fence + "```rust\nfn main".len()];

    let blocks = project(prefix);
    assert_eq!(
        blocks.last(),
        Some(&Block::Code {
            language: Some("rust".to_owned()),
            code: "fn main".to_owned(),
        })
    );
}
