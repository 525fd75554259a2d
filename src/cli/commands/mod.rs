pub mod site;
pub mod token;

pub use site::{GetCommands, ListCommands, handle_get_command, handle_list_command, handle_web_command};
pub use token::{TokenCommands, handle_scopes_command, handle_token_command};
