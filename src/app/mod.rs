pub mod analyzer;
pub mod injector;
pub mod reporter;
