mod identity;
mod record;

pub use identity::*;
pub use record::*;
