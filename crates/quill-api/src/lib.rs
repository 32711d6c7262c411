//! Wire value model, type signatures, and casting for quill RPC.
//!
//! This crate is the leaf of the workspace: it defines the runtime
//! representation of XML-RPC values ([`Value`], [`StructValue`]), the
//! declared-type model ([`SignatureEntry`], [`StructDescriptor`]), the
//! coercion rules between the two ([`cast_expects`], [`cast_returns`]),
//! and the fault shape carried by failed responses ([`Fault`]).

pub mod cast;
pub mod fault;
pub mod limits;
pub mod signature;
pub mod value;

pub use cast::cast_expects;
pub use cast::cast_returns;
pub use cast::cast_value;
pub use cast::CastError;
pub use fault::Fault;
pub use fault::FAULT_CODE_EXECUTION;
pub use fault::FAULT_CODE_REQUEST;
pub use fault::FAULT_CODE_RESOLUTION;
pub use signature::Param;
pub use signature::ScalarKind;
pub use signature::SignatureEntry;
pub use signature::StructDescriptor;
pub use value::StructValue;
pub use value::Value;
