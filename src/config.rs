use clap::Parser;

use crate::controller::{ControllerSettings, EmptyInputPolicy};
use crate::logging::LoggingArgs;
use crate::meta::UserIdentity;
use crate::net::tcp::DEFAULT_PORT;
use crate::ui::DEFAULT_SCROLLBACK;

/// Command line for the client.
#[derive(Parser, Debug)]
#[command(name = "chatterm", about = "Terminal chat client", version)]
pub struct Config {
    #[arg(short, long, env = "CHATTERM_USERNAME", help = "Name to join the room as")]
    pub username: String,

    #[arg(short, long, default_value = "general", help = "Room to join")]
    pub room: String,

    #[arg(short = 'H', long = "host-url", default_value = "localhost", help = "Chat server host")]
    pub host_url: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT, help = "Chat server port")]
    pub port: u16,

    #[arg(
        long,
        value_enum,
        default_value_t = EmptyInputPolicy::PassThrough,
        help = "What to do with blank submitted lines"
    )]
    pub empty_input: EmptyInputPolicy,

    #[arg(long, help = "Show your own lines in the chat pane as you send them")]
    pub echo: bool,

    #[arg(long, default_value_t = DEFAULT_SCROLLBACK, help = "Lines kept per log pane (0 = no limit)")]
    pub scrollback: usize,

    #[arg(long, help = "Play a scripted session instead of connecting")]
    pub demo: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl Config {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            local_user: Some(UserIdentity::new(self.username.as_str())),
            echo: self.echo,
            empty_input: self.empty_input,
        }
    }

    pub fn title(&self) -> String {
        if self.demo {
            format!("chatterm - {} (demo)", self.username)
        } else {
            format!("chatterm - {}@{} on {}:{}", self.username, self.room, self.host_url, self.port)
        }
    }

    pub fn status_header(&self) -> String {
        format!("Users in {}", self.room)
    }
}
