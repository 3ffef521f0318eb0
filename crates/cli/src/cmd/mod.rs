mod compile;
mod disk;
mod sources;

pub use compile::cmd_compile;
pub use disk::cmd_disk;
pub use sources::cmd_sources;
