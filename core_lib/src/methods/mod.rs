pub mod identifier;
pub mod registry;

pub use identifier::{MethodArg, MethodRef};
pub use registry::{MethodContext, MethodError, MethodRegistry, RequestInfo, ResolvedMethod};
