//! Fixed limits for requests and values.
//!
//! These constants bound what the codec and dispatcher will accept from
//! the wire. They are fixed and immutable, enforced at decode time.

// ============================================================================
// Request Limits
// ============================================================================

/// Maximum size of a request body in bytes (1 MB).
///
/// Fixed limit prevents memory exhaustion from oversized payloads. Checked
/// before any parsing happens.
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Maximum length of a method name in bytes.
///
/// Real method names (including layered `service.method` forms) are short;
/// anything longer is a malformed or hostile request.
pub const MAX_METHOD_NAME_LEN: usize = 256;

/// Maximum number of positional parameters in one call.
pub const MAX_CALL_PARAMS: usize = 64;

// ============================================================================
// Value Limits
// ============================================================================

/// Maximum nesting depth of a decoded value (32 levels).
///
/// Fixed limit prevents stack exhaustion from deeply nested arrays and
/// structs. Applied during recursive-descent parsing and encoding.
pub const MAX_VALUE_DEPTH: usize = 32;

// ============================================================================
// Multicall Limits
// ============================================================================

/// Maximum number of sub-calls in one `system.multicall` batch (64).
///
/// Fixed limit on batch fan-out prevents a single request from amplifying
/// into unbounded work.
pub const MAX_MULTICALL_CALLS: usize = 64;
