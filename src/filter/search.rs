use bson::{doc, Bson, Document};

use crate::database::models::Contato;

/// Free-text contact search split into a name pattern and a phone digit run.
///
/// A purely numeric term only matches phones; a term with any non-digit also
/// matches names. Phone matching is by substring, so a local number finds the
/// full international one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSearch {
    pub name: Option<String>,
    pub phone_digits: Option<String>,
}

impl ContactSearch {
    /// `None` when there is nothing to filter on
    pub fn parse(term: &str) -> Option<Self> {
        if term.is_empty() {
            return None;
        }

        let digits: String = term.chars().filter(|c| c.is_ascii_digit()).collect();
        let name = (digits.len() != term.len() || digits.is_empty()).then(|| term.to_string());
        let phone_digits = (!digits.is_empty()).then_some(digits);

        Some(Self { name, phone_digits })
    }

    pub fn matches(&self, contato: &Contato) -> bool {
        let by_name = match (&self.name, &contato.nome) {
            (Some(term), Some(nome)) => nome.to_lowercase().contains(&term.to_lowercase()),
            _ => false,
        };
        let by_phone = self
            .phone_digits
            .as_ref()
            .is_some_and(|digits| contato.telefone.contains(digits.as_str()));

        by_name || by_phone
    }

    /// `$match` stage applied after `telefone` and `nome` are projected
    pub fn to_match_stage(&self) -> Document {
        let mut branches: Vec<Bson> = Vec::new();
        if let Some(name) = &self.name {
            branches.push(Bson::Document(doc! {
                "nome": { "$regex": regex::escape(name), "$options": "i" }
            }));
        }
        if let Some(digits) = &self.phone_digits {
            branches.push(Bson::Document(doc! {
                "telefone": { "$regex": regex::escape(digits) }
            }));
        }
        doc! { "$match": { "$or": branches } }
    }
}
