// handlers/protected/mod.rs - endpoints behind the JWT gate

pub mod arquivos;
pub mod atendimentos;
pub mod contatos;

pub use arquivos::list_arquivos;
pub use atendimentos::{get_atendimento, list_mensagens};
pub use contatos::{list_atendimentos, list_contatos};
