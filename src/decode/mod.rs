//! Response decoder module
//!
//! Every Talkable endpoint answers with a JSON envelope. The decoder parses
//! the body and pulls the records out with a JSONPath expression, e.g.
//! `$.result.campaigns[*]`.

mod decoders;

pub use decoders::{first_match, JsonDecoder, RecordDecoder};
