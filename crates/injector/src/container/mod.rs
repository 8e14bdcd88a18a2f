pub mod bindings;
pub mod definition;
pub mod injectable;
pub mod injector;
pub mod invokable;
pub mod key;
pub mod provision;
pub mod resolver;
pub mod value;

pub use bindings::{BindingSummary, Bindings, Preparation};
pub use definition::{Argument, Definition, DELEGATE_PREFIX, RAW_PREFIX};
pub use injectable::Injectable;
pub use injector::Injector;
pub use invokable::{Body, Call, Closure, Executable, Invokable, Receiver};
pub use key::{TypeKey, NAMESPACE_SEPARATOR};
pub use resolver::ResolutionPath;
pub use value::{Arguments, Literal, Object, Value};
