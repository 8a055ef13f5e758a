mod command;

pub use command::CommandFetcher;
