pub(crate) mod check;
pub(crate) mod config;
pub(crate) mod init;
pub(crate) mod once;
pub(crate) mod watch;
