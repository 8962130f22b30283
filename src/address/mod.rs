//! Target address parsing.
//!
//! A target lists one or more `host-or-ip[:port]` segments separated by
//! commas. Parsing happens in two steps:
//! - [`parse_tokens`] splits the text into [`EndpointToken`]s (pure, no I/O)
//! - [`AddressParser::expand`] looks each host up and yields
//!   [`ResolvedEndpoint`]s, one per literal address

mod endpoint;
mod parser;

pub use endpoint::{EndpointToken, ResolvedEndpoint};
pub use parser::{parse_tokens, AddressParser};
