pub mod format;
pub(crate) mod io;
