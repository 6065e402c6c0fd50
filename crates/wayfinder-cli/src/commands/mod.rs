// One module per subcommand. main.rs parses arguments and dispatches here.

pub mod locations;
pub mod route;
pub mod validate;
