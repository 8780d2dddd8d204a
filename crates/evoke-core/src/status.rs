//! Response status codes
//!
//! Numeric codes carried in the outbound envelope. The dispatch layer itself
//! only ever sets [`OK`] and [`INTERNAL_SERVER_ERROR`]; the rest are for
//! handler code.

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const ACCEPTED: u16 = 202;

pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const CONFLICT: u16 = 409;

/// Statuses above this value already signal a server-side failure and are
/// left untouched by error escalation.
pub const SERVER_ERROR_THRESHOLD: u16 = 499;

pub const INTERNAL_SERVER_ERROR: u16 = 500;
pub const NOT_IMPLEMENTED: u16 = 501;
pub const SERVICE_UNAVAILABLE: u16 = 503;
