//! Typed tool arguments. Defaults mirror the advertised input schemas in `catalog`.

pub(crate) mod api;
pub(crate) mod deploy;
pub(crate) mod diagnostics;
pub(crate) mod lifecycle;
pub(crate) mod services;

pub(crate) use diagnostics::Component;
