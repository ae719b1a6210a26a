pub mod chat_llm;
pub mod db;
pub mod feed;

pub use chat_llm::OpenAiChatAdapter;
pub use db::DbAdapter;
pub use feed::PgChangeFeed;
