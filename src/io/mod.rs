pub mod compression;
pub mod container;
pub mod glob;
pub mod text;
