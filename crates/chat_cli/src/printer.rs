use std::collections::HashMap;
use std::io::{self, Write};

use stream_transcript::{Message, MessageId, Role, TranscriptEvent};

/// Writes transcript changes to a terminal as they happen.
///
/// Assistant replies are printed incrementally: each update writes only the
/// text past what was already printed.
pub struct TranscriptPrinter<W: Write> {
    out: W,
    printed: HashMap<MessageId, usize>,
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn handle(&mut self, event: &TranscriptEvent) -> io::Result<()> {
        match event {
            TranscriptEvent::Appended(message) => self.appended(message)?,
            TranscriptEvent::Updated { id, text } => {
                let printed = self.printed.entry(id.clone()).or_insert(0);
                if let Some(delta) = text.get(*printed..) {
                    self.out.write_all(delta.as_bytes())?;
                }
                *printed = text.len();
            }
            TranscriptEvent::Closed { id } => {
                if self.printed.remove(id).is_some() {
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()
    }

    fn appended(&mut self, message: &Message) -> io::Result<()> {
        match message.role() {
            Role::User => Ok(()),
            Role::Assistant => {
                write!(self.out, "assistant> {}", message.text())?;
                if message.is_open() {
                    self.printed
                        .insert(message.id().clone(), message.text().len());
                    Ok(())
                } else {
                    writeln!(self.out)
                }
            }
            Role::System => writeln!(self.out, "[system] {}", message.text()),
            Role::Error => writeln!(self.out, "[error] {}", message.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_transcript::{TextUpdate, Transcript};

    fn render(transcript_ops: impl FnOnce(&mut Transcript)) -> String {
        let mut transcript = Transcript::new();
        let mut events = transcript.subscribe();
        transcript_ops(&mut transcript);

        let mut printer = TranscriptPrinter::new(Vec::new());
        while let Ok(event) = events.try_recv() {
            printer.handle(&event).expect("write to buffer");
        }
        String::from_utf8(printer.into_inner()).expect("utf8 output")
    }

    #[test]
    fn streamed_reply_prints_deltas_once() {
        let output = render(|transcript| {
            transcript.append(Message::user("hi")).expect("user");
            let reply = Message::assistant_placeholder();
            let id = reply.id().clone();
            transcript.append(reply).expect("assistant");
            for text in ["He", "Hello", "Hello, wörld"] {
                transcript
                    .update(&id, TextUpdate::Replace(text.to_owned()))
                    .expect("update");
            }
            transcript.close(&id).expect("close");
        });

        assert_eq!(output, "assistant> Hello, wörld\n");
    }

    #[test]
    fn system_and_error_messages_are_labelled() {
        let output = render(|transcript| {
            transcript
                .append(Message::system("Document \"a.txt\" uploaded"))
                .expect("system");
            transcript
                .append(Message::error("Sorry, I'm having trouble connecting to the server."))
                .expect("error");
        });

        assert_eq!(
            output,
            "[system] Document \"a.txt\" uploaded\n[error] Sorry, I'm having trouble connecting to the server.\n"
        );
    }
}
