pub mod cfg;
pub mod class;
pub mod instruction;
pub mod method;
pub mod shared;
pub mod typing;
pub mod value;
