//! Static type descriptors and runtime values.

mod type_desc;
mod value;

pub use type_desc::TypeDesc;
pub use value::Value;
