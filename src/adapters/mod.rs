pub mod fs;
pub mod typescript;
