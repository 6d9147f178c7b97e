//! Wire protocol: request kinds, paths, response envelope and validation.

mod request;
mod response;

pub use request::{Request, RequestKind};
pub use response::{
    GameUpdatePayload, RawResponse, RulesCatalog, TransportError, ValidationError, check_error,
    check_formula_state,
};
