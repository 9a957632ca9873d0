//! Flow record model and bus codec.

mod codec;
mod model;

pub use codec::{CodecError, FlowCodec};
pub use model::{Direction, FlowDocument, NodeInfo, UNKNOWN_APPLICATION};
