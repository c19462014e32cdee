//! Line-oriented terminal front end for `stream_transcript`.
//!
//! ## Configuration
//!
//! - `STREAM_TRANSCRIPT_BASE_URL`: backend base URL (default `http://127.0.0.1:5006`)
//! - `STREAM_TRANSCRIPT_TIMEOUT_SECS`: optional whole-request timeout, > 0
//! - `STREAM_TRANSCRIPT_LOG`: log filter directive (default `info`), logs go to stderr
//! - `STREAM_TRANSCRIPT_DEBUG=1`: force `debug` logging
//!
//! Plain lines are sent as chat turns; lines starting with `/` are commands
//! (see [`commands::HELP_TEXT`]).

pub mod commands;
pub mod printer;
