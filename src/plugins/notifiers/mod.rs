// Notifier implementations
pub mod discord;
pub mod log;

pub use discord::DiscordNotifier;
pub use self::log::LogNotifier;
