// Core module - AS monitor protocol engine
pub mod framer;
pub mod session;
pub mod terminal;
pub mod variables;

#[cfg(test)]
pub(crate) mod testing;
