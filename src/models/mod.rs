pub mod image;
pub mod prompt;

pub use self::image::*;
pub use self::prompt::*;
