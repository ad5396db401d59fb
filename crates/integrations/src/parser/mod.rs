mod client;

pub use client::{IntentParserClient, ParserError};
