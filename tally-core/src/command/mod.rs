//! Operator command handling
//!
//! Lines are tokenized by [`parser`], executed by [`dispatcher`] against
//! the aggregator state, and answered through one of the dialects in
//! [`dialect`].

pub mod dialect;
pub mod dispatcher;
pub mod parser;
pub mod response;

pub use dialect::{sink_for, PcDialect, ResponseSink, ScoreboardDialect, TerminalDialect};
pub use dispatcher::{dispatch_line, execute, reject_line, respond, CommandError, Effect};
pub use parser::{parse, split, CommandKind, ParseError, COMMANDS};
pub use response::{DemoReply, ErrorReply, Response, TournamentReply};
