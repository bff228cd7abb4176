pub mod arquivo;
pub mod contato;
pub mod usuario;

pub use arquivo::{Anexo, Arquivo};
pub use contato::{normalize_phone, Contato, ContatoRow};
pub use usuario::{Atendente, LoginUser};

use bson::Bson;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

/// Collection names
pub const ATENDIMENTOS: &str = "atendimentos";
pub const MENSAGENS: &str = "atendimentos_mensagens";
pub const ARQUIVOS: &str = "arquivos";
pub const ATENDENTES: &str = "usuarios";
pub const CLIENTES: &str = "clientes_users";
pub const USUARIOS_VIEWER: &str = "usuarios_viewer";

/// Field decoder for collections written by other systems: a value of the
/// wrong type reads as absent instead of failing the whole document.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Bson>::deserialize(deserializer)?;
    Ok(value.and_then(|v| bson::from_bson(v).ok()))
}
