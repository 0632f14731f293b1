pub mod colors;
pub mod history;
pub mod tools;
