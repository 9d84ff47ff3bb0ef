pub mod logger;
pub mod telegram;

pub use logger::RunLogger;
pub use telegram::TelegramNotifier;
