pub mod file;
pub mod hash;
pub mod text;
pub mod time;
