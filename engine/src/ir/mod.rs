pub mod adapter;
pub mod bridge;
