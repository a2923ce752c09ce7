mod account;
mod integrity;
mod statement;

pub use account::*;
pub use integrity::*;
pub use statement::*;
