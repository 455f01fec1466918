//! Collection members, one per kind of child the input tree declares

pub mod identity;
pub mod project;
pub mod quota;
pub mod region;
pub mod resource;
pub mod storage_class;
