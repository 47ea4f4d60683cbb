pub mod response;

pub use response::{
    response_envelope_middleware, EnvelopeBypass, EnvelopeRules, PathKind, RequestDescriptor,
};
